//! Flash-loan call data

use ethers::abi::Token;
use ethers::types::{Address, Bytes, U256};
use ethers::utils::keccak256;
use flashroute_models::RoutingArray;

pub const FLASH_LOAN_SIGNATURE: &str = "requestFlashLoan(address,uint256,uint256[],bytes[])";

pub fn flash_loan_selector() -> [u8; 4] {
    let hash = keccak256(FLASH_LOAN_SIGNATURE);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encode `requestFlashLoan(token, amount, routing, txData)`
pub fn encode_flash_loan(
    token: Address,
    amount: U256,
    routing: &RoutingArray,
    tx_data: &[Bytes],
) -> Bytes {
    let args = ethers::abi::encode(&[
        Token::Address(token),
        Token::Uint(amount),
        Token::Array(routing.values().iter().copied().map(Token::Uint).collect()),
        Token::Array(tx_data.iter().map(|d| Token::Bytes(d.to_vec())).collect()),
    ]);

    let mut calldata = flash_loan_selector().to_vec();
    calldata.extend_from_slice(&args);
    Bytes::from(calldata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::ParamType;
    use flashroute_models::ROUTING_WIDTH;

    #[test]
    fn test_calldata_layout() {
        let token: Address = "0x525574c899a7c877a11865339e57376092168258".parse().unwrap();
        let amount = U256::from(1000u64);
        let routing =
            RoutingArray::from_ids(vec![U256::from(7u64), U256::from(9u64)], ROUTING_WIDTH)
                .unwrap();
        let legs = vec![Bytes::from(vec![0xde, 0xad])];

        let calldata = encode_flash_loan(token, amount, &routing, &legs);
        assert_eq!(calldata[..4], flash_loan_selector());

        let decoded = ethers::abi::decode(
            &[
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::Array(Box::new(ParamType::Uint(256))),
                ParamType::Array(Box::new(ParamType::Bytes)),
            ],
            &calldata[4..],
        )
        .unwrap();

        assert_eq!(decoded[0], Token::Address(token));
        assert_eq!(decoded[1], Token::Uint(amount));
        let Token::Array(route) = &decoded[2] else {
            panic!("routing is not an array");
        };
        assert_eq!(route.len(), ROUTING_WIDTH);
        assert_eq!(route[1], Token::Uint(U256::from(9u64)));
        assert_eq!(route[2], Token::Uint(U256::zero()));
        assert_eq!(decoded[3], Token::Array(vec![Token::Bytes(vec![0xde, 0xad])]));
    }

    #[test]
    fn test_empty_tx_data() {
        let routing = RoutingArray::from_ids(vec![U256::one()], 2).unwrap();
        let calldata = encode_flash_loan(Address::zero(), U256::one(), &routing, &[]);
        // selector, four head words, routing length plus two entries, empty bytes[] length
        assert_eq!(calldata.len(), 4 + 32 * (4 + 3 + 1));
    }
}
