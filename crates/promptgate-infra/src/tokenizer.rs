//! BPE token counting backed by tiktoken.
//!
//! Encoding tables are lazily initialized once per process via tiktoken's
//! singletons and shared across threads. The same encoding + text pair
//! always yields the same count, which the billing path depends on.

use tiktoken_rs::CoreBPE;

use promptgate_core::tokenizer::Tokenizer;
use promptgate_types::model::TokenEncoding;

/// Tokenizer over tiktoken's `cl100k_base` and `o200k_base` tables.
#[derive(Default)]
pub struct TiktokenTokenizer;

impl TiktokenTokenizer {
    pub fn new() -> Self {
        Self
    }
}

fn bpe_for(encoding: TokenEncoding) -> &'static CoreBPE {
    match encoding {
        TokenEncoding::Cl100kBase => tiktoken_rs::cl100k_base_singleton(),
        TokenEncoding::O200kBase => tiktoken_rs::o200k_base_singleton(),
    }
}

/// Encoding tables take ~200ms to load. This loads them on demand at
/// startup, outside the request path.
pub fn preload_encodings() {
    let _ = tiktoken_rs::cl100k_base_singleton();
    let _ = tiktoken_rs::o200k_base_singleton();
}

impl Tokenizer for TiktokenTokenizer {
    fn count(&self, encoding: TokenEncoding, text: &str) -> usize {
        bpe_for(encoding).encode_with_special_tokens(text).len()
    }
}
