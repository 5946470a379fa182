use ethers::abi::{Event, HumanReadableParser, RawLog, Token};
use ethers::types::{Address, Bytes, Log};

use crate::chain::ChainError;

/// Encode a call to a function given in human-readable form, e.g.
/// `function executeTrade(address tokenIn, address tokenOut, uint256 amountIn,
/// uint256 minAmountOut, uint256 deadline) returns (uint256)`.
pub fn encode_function_call(signature: &str, args: &[Token]) -> Result<Bytes, ChainError> {
    let function = HumanReadableParser::parse_function(signature)
        .map_err(|e| ChainError::Abi(e.to_string()))?;
    let data = function
        .encode_input(args)
        .map_err(|e| ChainError::Abi(e.to_string()))?;
    Ok(Bytes::from(data))
}

/// Decode a single ABI-encoded `address` return value (one 32-byte word,
/// address right-aligned).
pub fn decode_address_return(data: &Bytes) -> Result<Address, ChainError> {
    if data.len() < 32 {
        return Err(ChainError::BadReturnData(format!(
            "expected 32-byte address word, got {} bytes",
            data.len()
        )));
    }
    Ok(Address::from_slice(&data[12..32]))
}

/// Parse an event out of a human-readable ABI fragment, e.g.
/// `event PairCreated(address indexed token0, address indexed token1,
/// address pair, uint256)`.
pub fn parse_event(event_abi: &str) -> Result<Event, ChainError> {
    HumanReadableParser::parse_event(event_abi).map_err(|e| ChainError::Abi(e.to_string()))
}

/// Decode a raw node log against a parsed event, returning the tokens in
/// declaration order. Logs that do not match the event shape yield `None`.
pub fn decode_log(event: &Event, log: &Log) -> Option<Vec<Token>> {
    let raw = RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    };
    let decoded = event.parse_log(raw).ok()?;
    Some(decoded.params.into_iter().map(|p| p.value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{H256, U256};

    #[test]
    fn encodes_function_with_selector() {
        let data = encode_function_call(
            "function transferOwnership(address newOwner)",
            &[Token::Address(Address::repeat_byte(0x11))],
        )
        .unwrap();
        // 4-byte selector + one 32-byte word
        assert_eq!(data.len(), 36);
    }

    #[test]
    fn decodes_address_word() {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(Address::repeat_byte(0xab).as_bytes());
        let addr = decode_address_return(&Bytes::from(word.to_vec())).unwrap();
        assert_eq!(addr, Address::repeat_byte(0xab));
    }

    #[test]
    fn short_return_data_is_rejected() {
        assert!(decode_address_return(&Bytes::from(vec![0u8; 4])).is_err());
    }

    #[test]
    fn decodes_pair_created_log() {
        let event = parse_event(
            "event PairCreated(address indexed token0, address indexed token1, address pair, uint256)",
        )
        .unwrap();

        let token0 = Address::repeat_byte(0x01);
        let token1 = Address::repeat_byte(0x02);
        let pair = Address::repeat_byte(0x03);

        let mut data = Vec::new();
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(pair.as_bytes());
        data.extend_from_slice(&word);
        let mut len_word = [0u8; 32];
        U256::from(7u64).to_big_endian(&mut len_word);
        data.extend_from_slice(&len_word);

        let log = Log {
            topics: vec![
                event.signature(),
                H256::from(token0),
                H256::from(token1),
            ],
            data: Bytes::from(data),
            ..Default::default()
        };

        let tokens = decode_log(&event, &log).unwrap();
        assert_eq!(tokens[0], Token::Address(token0));
        assert_eq!(tokens[1], Token::Address(token1));
        assert_eq!(tokens[2], Token::Address(pair));
    }

    #[test]
    fn mismatched_log_is_dropped() {
        let event = parse_event(
            "event PairCreated(address indexed token0, address indexed token1, address pair, uint256)",
        )
        .unwrap();
        let log = Log {
            topics: vec![H256::zero()],
            data: Bytes::default(),
            ..Default::default()
        };
        assert!(decode_log(&event, &log).is_none());
    }
}
