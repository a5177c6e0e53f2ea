mod http_error;
mod openai;

pub use http_error::{LlmHttpError, LlmHttpErrorKind};
pub use openai::OpenAiCompatLlm;
