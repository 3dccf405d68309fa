/// Maximum accepted size of a metrics request body (bytes).
pub const MAX_BODY_SIZE: usize = 1_048_576;
