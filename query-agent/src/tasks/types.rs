/// Keys under which pipeline tasks exchange data through the flow context
pub mod context_keys {
    pub const RUN_ID: &str = "run_id";
    pub const USER_QUERY: &str = "user_query";
    pub const ENTITIES: &str = "entities";
    pub const PROMPT: &str = "prompt";
    pub const RAW_RESPONSE: &str = "raw_response";
    pub const INTERPRETATION: &str = "interpretation";
}
