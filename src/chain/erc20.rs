use ethers::abi::HumanReadableParser;
use ethers::types::Address;
use tracing::trace;

use crate::chain::{abi, ChainReader, ContractCall};

/// Metadata read from a token contract's getters. Every field degrades to a
/// default when the contract misbehaves; a token with a broken `symbol()`
/// still flows through discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            name: String::new(),
            decimals: 18,
        }
    }
}

async fn call_getter(
    reader: &dyn ChainReader,
    token: Address,
    signature: &str,
) -> Option<Vec<ethers::abi::Token>> {
    let function = HumanReadableParser::parse_function(signature).ok()?;
    let data = abi::encode_function_call(signature, &[]).ok()?;
    let raw = reader.call(&ContractCall::new(token, data)).await.ok()?;
    function.decode_output(&raw).ok()
}

/// Query symbol/name/decimals via the chain-read interface. Never fails:
/// missing or malformed getters fall back to defaults.
pub async fn token_metadata(reader: &dyn ChainReader, token: Address) -> TokenMetadata {
    let mut metadata = TokenMetadata::default();

    if let Some(tokens) = call_getter(reader, token, "function symbol() returns (string)").await {
        if let Some(symbol) = tokens.into_iter().next().and_then(|t| t.into_string()) {
            metadata.symbol = symbol;
        }
    }
    if let Some(tokens) = call_getter(reader, token, "function name() returns (string)").await {
        if let Some(name) = tokens.into_iter().next().and_then(|t| t.into_string()) {
            metadata.name = name;
        }
    }
    if let Some(tokens) = call_getter(reader, token, "function decimals() returns (uint8)").await {
        if let Some(decimals) = tokens.into_iter().next().and_then(|t| t.into_uint()) {
            metadata.decimals = decimals.low_u32().min(255) as u8;
        }
    }

    trace!(?token, symbol = %metadata.symbol, "token metadata resolved");
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainError;
    use async_trait::async_trait;
    use ethers::abi::Token;
    use ethers::types::{Bytes, U256};

    /// Answers every call with a canned ABI-encoded output per selector.
    struct GetterReader;

    #[async_trait]
    impl ChainReader for GetterReader {
        async fn call(&self, call: &ContractCall) -> Result<Bytes, ChainError> {
            let selector = &call.data[..4];
            let symbol_data =
                abi::encode_function_call("function symbol() returns (string)", &[]).unwrap();
            let decimals_data =
                abi::encode_function_call("function decimals() returns (uint8)", &[]).unwrap();
            if selector == &symbol_data[..4] {
                Ok(Bytes::from(ethers::abi::encode(&[Token::String(
                    "FOO".to_string(),
                )])))
            } else if selector == &decimals_data[..4] {
                Ok(Bytes::from(ethers::abi::encode(&[Token::Uint(
                    U256::from(9u64),
                )])))
            } else {
                Err(ChainError::Transport("name() not implemented".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn partial_getters_degrade_to_defaults() {
        let metadata = token_metadata(&GetterReader, Address::repeat_byte(0x01)).await;
        assert_eq!(metadata.symbol, "FOO");
        assert_eq!(metadata.decimals, 9);
        // name() reverted: default survives
        assert_eq!(metadata.name, "");
    }
}
