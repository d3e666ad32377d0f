//! Contract invocation script decoder
//!
//! Qtum transactions that call or create contracts carry an output script
//! whose disassembly (the `asm` field of `scriptPubKey`) is a space separated
//! list of operands and opcodes. This module reads that token list back into
//! the fields an Ethereum client expects on a transaction.
//!
//! Four script shapes occur on chain:
//!
//! ```text
//! call   + sender: version sender sig OP_SENDER vm gas_limit gas_price data contract OP_CALL
//! create + sender: version sender sig OP_SENDER vm gas_limit gas_price code OP_CREATE
//! call:                                          vm gas_limit gas_price data contract OP_CALL
//! create:                                        vm gas_limit gas_price code OP_CREATE
//! ```
//!
//! Decoding is strict. Every slot is checked in order and the first mismatch
//! is reported with its position.

use crate::error::AsmError;
use serde::Serialize;

/// Marks the end of the sender metadata prefix.
pub const OP_SENDER: &str = "OP_SENDER";
/// Terminates a contract call script.
pub const OP_CALL: &str = "OP_CALL";
/// Terminates a contract creation script.
pub const OP_CREATE: &str = "OP_CREATE";

/// Index of `OP_SENDER` in a sender-prefixed script.
const SENDER_MARKER_POSITION: usize = 3;

/// Hex digits in a 20-byte address.
const ADDRESS_HEX_LEN: usize = 40;

/// Fields recovered from a contract invocation script.
///
/// All values are hex digits without a `0x` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInvokeInfo {
    /// Sender address, empty when the script has no sender metadata
    pub from: String,
    /// Gas limit, converted from the little-endian script operand
    pub gas_limit: String,
    /// Gas price exactly as it appears in the script
    pub gas_price: String,
    /// Call payload or creation bytecode
    pub call_data: String,
    /// Contract address, empty for contract creation
    pub to: String,
}

impl ContractInvokeInfo {
    /// True when the script deploys a new contract.
    pub fn is_create(&self) -> bool {
        self.to.is_empty()
    }
}

/// The script layouts the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptShape {
    CallWithSender,
    CreateWithSender,
    Call,
    Create,
}

/// One position in a script grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    VersionFlag,
    Sender,
    SenderSignature,
    VmVersion,
    GasLimit,
    GasPrice,
    CallData,
    Contract,
    Marker(&'static str),
}

impl Slot {
    fn name(self) -> &'static str {
        match self {
            Slot::VersionFlag => "version flag",
            Slot::Sender => "sender address",
            Slot::SenderSignature => "sender signature script",
            Slot::VmVersion => "vm version",
            Slot::GasLimit => "gas limit",
            Slot::GasPrice => "gas price",
            Slot::CallData => "call data",
            Slot::Contract => "contract address",
            Slot::Marker(marker) => marker,
        }
    }
}

const CALL_WITH_SENDER: &[Slot] = &[
    Slot::VersionFlag,
    Slot::Sender,
    Slot::SenderSignature,
    Slot::Marker(OP_SENDER),
    Slot::VmVersion,
    Slot::GasLimit,
    Slot::GasPrice,
    Slot::CallData,
    Slot::Contract,
    Slot::Marker(OP_CALL),
];

const CREATE_WITH_SENDER: &[Slot] = &[
    Slot::VersionFlag,
    Slot::Sender,
    Slot::SenderSignature,
    Slot::Marker(OP_SENDER),
    Slot::VmVersion,
    Slot::GasLimit,
    Slot::GasPrice,
    Slot::CallData,
    Slot::Marker(OP_CREATE),
];

const CALL: &[Slot] = &[
    Slot::VmVersion,
    Slot::GasLimit,
    Slot::GasPrice,
    Slot::CallData,
    Slot::Contract,
    Slot::Marker(OP_CALL),
];

const CREATE: &[Slot] = &[
    Slot::VmVersion,
    Slot::GasLimit,
    Slot::GasPrice,
    Slot::CallData,
    Slot::Marker(OP_CREATE),
];

impl ScriptShape {
    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ScriptShape::CallWithSender => "call with sender",
            ScriptShape::CreateWithSender => "create with sender",
            ScriptShape::Call => "call",
            ScriptShape::Create => "create",
        }
    }

    fn grammar(self) -> &'static [Slot] {
        match self {
            ScriptShape::CallWithSender => CALL_WITH_SENDER,
            ScriptShape::CreateWithSender => CREATE_WITH_SENDER,
            ScriptShape::Call => CALL,
            ScriptShape::Create => CREATE,
        }
    }

    /// Pick the grammar for a token stream.
    ///
    /// A script is sender-prefixed when `OP_SENDER` sits at position 3; the
    /// final token selects call or create.
    pub fn detect<S: AsRef<str>>(tokens: &[S]) -> Result<Self, AsmError> {
        let last = tokens.last().ok_or(AsmError::Empty)?.as_ref();
        let with_sender = tokens
            .get(SENDER_MARKER_POSITION)
            .is_some_and(|t| t.as_ref() == OP_SENDER);

        match (with_sender, last) {
            (true, OP_CALL) => Ok(ScriptShape::CallWithSender),
            (true, OP_CREATE) => Ok(ScriptShape::CreateWithSender),
            (false, OP_CALL) => Ok(ScriptShape::Call),
            (false, OP_CREATE) => Ok(ScriptShape::Create),
            (_, other) => Err(AsmError::UnexpectedToken {
                position: tokens.len() - 1,
                expected: "OP_CALL or OP_CREATE",
                found: other.to_string(),
            }),
        }
    }
}

/// Split a disassembled script into tokens.
pub fn tokenize(asm: &str) -> Vec<&str> {
    asm.split_whitespace().collect()
}

/// Decode a call script carrying sender metadata.
pub fn parse_call_sender_asm<S: AsRef<str>>(tokens: &[S]) -> Result<ContractInvokeInfo, AsmError> {
    decode(ScriptShape::CallWithSender, tokens)
}

/// Decode a create script carrying sender metadata.
pub fn parse_create_sender_asm<S: AsRef<str>>(
    tokens: &[S],
) -> Result<ContractInvokeInfo, AsmError> {
    decode(ScriptShape::CreateWithSender, tokens)
}

/// Decode a call script without sender metadata.
pub fn parse_call_asm<S: AsRef<str>>(tokens: &[S]) -> Result<ContractInvokeInfo, AsmError> {
    decode(ScriptShape::Call, tokens)
}

/// Decode a create script without sender metadata.
pub fn parse_create_asm<S: AsRef<str>>(tokens: &[S]) -> Result<ContractInvokeInfo, AsmError> {
    decode(ScriptShape::Create, tokens)
}

/// Detect the script shape and decode it.
pub fn parse_contract_asm<S: AsRef<str>>(tokens: &[S]) -> Result<ContractInvokeInfo, AsmError> {
    let shape = ScriptShape::detect(tokens)?;
    decode(shape, tokens)
}

/// Decode `tokens` against the grammar for `shape`.
pub fn decode<S: AsRef<str>>(
    shape: ScriptShape,
    tokens: &[S],
) -> Result<ContractInvokeInfo, AsmError> {
    let grammar = shape.grammar();
    if tokens.is_empty() {
        return Err(AsmError::Empty);
    }
    if tokens.len() != grammar.len() {
        return Err(AsmError::TokenCount {
            shape: shape.name(),
            expected: grammar.len(),
            got: tokens.len(),
        });
    }

    let mut info = ContractInvokeInfo::default();
    for (position, (slot, token)) in grammar.iter().zip(tokens).enumerate() {
        let token = token.as_ref();
        match *slot {
            Slot::Marker(marker) => {
                if token != marker {
                    return Err(AsmError::UnexpectedToken {
                        position,
                        expected: marker,
                        found: token.to_string(),
                    });
                }
            }
            Slot::VersionFlag | Slot::SenderSignature | Slot::VmVersion => {
                expect_hex(*slot, position, token)?;
            }
            Slot::Sender => {
                expect_address(*slot, position, token)?;
                info.from = token.to_string();
            }
            Slot::Contract => {
                expect_address(*slot, position, token)?;
                info.to = token.to_string();
            }
            Slot::GasLimit => {
                info.gas_limit = decode_gas_limit(position, token)?;
            }
            Slot::GasPrice => {
                expect_hex(*slot, position, token)?;
                info.gas_price = token.to_string();
            }
            Slot::CallData => {
                expect_hex(*slot, position, token)?;
                info.call_data = token.to_string();
            }
        }
    }

    Ok(info)
}

/// Reverse the byte order of a hex string, two digits at a time.
///
/// `"90d003"` becomes `"03d090"`. Letter case is preserved, so applying the
/// function twice returns the input.
pub fn reverse_byte_pairs(hex_str: &str) -> Result<String, hex::FromHexError> {
    hex::decode(hex_str)?;
    let reversed = hex_str
        .as_bytes()
        .chunks(2)
        .rev()
        .flat_map(|pair| pair.iter().map(|&b| b as char))
        .collect();
    Ok(reversed)
}

/// Gas limit operands are little-endian script numbers. Emit them as a
/// big-endian hex number without leading zero digits.
fn decode_gas_limit(position: usize, token: &str) -> Result<String, AsmError> {
    let field = Slot::GasLimit.name();
    let reversed = reverse_byte_pairs(token).map_err(|err| match err {
        hex::FromHexError::OddLength => AsmError::OddLength {
            field,
            position,
            len: token.len(),
        },
        _ => AsmError::InvalidHex {
            field,
            position,
            token: token.to_string(),
        },
    })?;
    if reversed.is_empty() {
        return Err(AsmError::InvalidHex {
            field,
            position,
            token: token.to_string(),
        });
    }

    let trimmed = reversed.trim_start_matches('0');
    if trimmed.is_empty() {
        Ok("0".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn is_hex(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn expect_hex(slot: Slot, position: usize, token: &str) -> Result<(), AsmError> {
    if is_hex(token) {
        Ok(())
    } else {
        Err(AsmError::InvalidHex {
            field: slot.name(),
            position,
            token: token.to_string(),
        })
    }
}

fn expect_address(slot: Slot, position: usize, token: &str) -> Result<(), AsmError> {
    expect_hex(slot, position, token)?;
    if token.len() != ADDRESS_HEX_LEN {
        return Err(AsmError::AddressLength {
            field: slot.name(),
            position,
            len: token.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // qtum.info/tx/0425fa39feed4cd6c93998159901095c147f8b0043823067dc1d25dabf950ac9
    const CALL_SENDER_ASM: &str = "01 93594441cb5de8b497ad8467d55412c2a0ef3659 6a4730440220396b30b7a2f2af482e585473b7575dd2f989f3f3d7cdee55fa34e93f23d5254d022055326cdcab38c58dc3e65c458bfb656cca8340f59534c00ad98b4d4d3303f459012103379c39b6fb2c705db608f98a8fc064f94c66faf894996ca88595487f9ef04a6e OP_SENDER 04 90d003 28 3d666e8b 0000000000000000000000000000000000000086 OP_CALL";

    const CREATE_SENDER_ASM: &str = "1 7926223070547d2d15b2ef5e7383e541c338ffe9 6a473044022067ca66b0308ae16aeca7a205ce0490b44a61feebe5632710b52aabde197f9e4802200e8beec61a58dbe1279a9cdb68983080052ae7b9997bc863b7c5623e4cb55fdb01210299d391f528b9edd07284c7e23df8415232a8ce41531cf460a390ce32b4efd112 OP_SENDER 4 b79166 64 6060604052341561000f57600080fd5b60008054600160a060020a033316 OP_CREATE";

    // qtum.info/tx/d20c5c31536e60decf175caf2cbfba980c3678c0f4b201c9b9fa1440102e6451
    const CALL_DATA: &str = "095ea7b300000000000000000000000025495b3a87d82e9d7a71b341addfc0d7bb3475c7ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
    const CALL_CONTRACT: &str = "54fefdb5b31164f66ddb68becd7bdd864cacd65b";

    const CREATE_BYTECODE: &str = "60806040526b033b2e3c9fd0803ce80000006006553480156200002157600080fd5b50";

    fn call_asm() -> String {
        format!("4 90d003 28 {} {} OP_CALL", CALL_DATA, CALL_CONTRACT)
    }

    #[test]
    fn test_parse_call_sender_asm() {
        let info = parse_call_sender_asm(&tokenize(CALL_SENDER_ASM)).unwrap();
        assert_eq!(
            info,
            ContractInvokeInfo {
                from: "93594441cb5de8b497ad8467d55412c2a0ef3659".into(),
                gas_limit: "3d090".into(),
                gas_price: "28".into(),
                call_data: "3d666e8b".into(),
                to: "0000000000000000000000000000000000000086".into(),
            }
        );
        assert!(!info.is_create());
    }

    #[test]
    fn test_parse_create_sender_asm() {
        let info = parse_create_sender_asm(&tokenize(CREATE_SENDER_ASM)).unwrap();
        assert_eq!(info.from, "7926223070547d2d15b2ef5e7383e541c338ffe9");
        assert_eq!(info.gas_limit, "6691b7");
        assert_eq!(info.gas_price, "64");
        assert_eq!(info.call_data, "6060604052341561000f57600080fd5b60008054600160a060020a033316");
        assert_eq!(info.to, "");
        assert!(info.is_create());
    }

    #[test]
    fn test_parse_call_asm() {
        let asm = call_asm();
        let info = parse_call_asm(&tokenize(&asm)).unwrap();
        assert_eq!(info.from, "");
        assert_eq!(info.gas_limit, "3d090");
        assert_eq!(info.gas_price, "28");
        assert_eq!(info.call_data, CALL_DATA);
        assert_eq!(info.to, CALL_CONTRACT);
    }

    #[test]
    fn test_parse_create_asm() {
        let asm = format!("04 a02526 28 {} OP_CREATE", CREATE_BYTECODE);
        let info = parse_create_asm(&tokenize(&asm)).unwrap();
        assert_eq!(
            info,
            ContractInvokeInfo {
                from: String::new(),
                gas_limit: "2625a0".into(),
                gas_price: "28".into(),
                call_data: CREATE_BYTECODE.into(),
                to: String::new(),
            }
        );
    }

    #[test]
    fn test_owned_tokens_are_accepted() {
        let tokens: Vec<String> = CALL_SENDER_ASM.split(' ').map(String::from).collect();
        let info = parse_call_sender_asm(&tokens).unwrap();
        assert_eq!(info.gas_limit, "3d090");
    }

    #[test]
    fn test_detect_shape() {
        assert_eq!(
            ScriptShape::detect(&tokenize(CALL_SENDER_ASM)).unwrap(),
            ScriptShape::CallWithSender
        );
        assert_eq!(
            ScriptShape::detect(&tokenize(CREATE_SENDER_ASM)).unwrap(),
            ScriptShape::CreateWithSender
        );
        assert_eq!(ScriptShape::detect(&tokenize(&call_asm())).unwrap(), ScriptShape::Call);
        assert_eq!(
            ScriptShape::detect(&["04", "a02526", "28", "6080", "OP_CREATE"]).unwrap(),
            ScriptShape::Create
        );
    }

    #[test]
    fn test_parse_contract_asm_dispatches_every_shape() {
        let call_sender = parse_contract_asm(&tokenize(CALL_SENDER_ASM)).unwrap();
        assert_eq!(call_sender.to, "0000000000000000000000000000000000000086");

        let create_sender = parse_contract_asm(&tokenize(CREATE_SENDER_ASM)).unwrap();
        assert!(create_sender.is_create());
        assert!(!create_sender.from.is_empty());

        let call = parse_contract_asm(&tokenize(&call_asm())).unwrap();
        assert_eq!(call.from, "");
        assert_eq!(call.to, CALL_CONTRACT);

        let create = parse_contract_asm(&["04", "a02526", "28", CREATE_BYTECODE, "OP_CREATE"]).unwrap();
        assert_eq!(create.to, "");
        assert_eq!(create.gas_limit, "2625a0");
    }

    #[test]
    fn test_non_contract_script_is_rejected() {
        let asm = "OP_DUP OP_HASH160 dfa6e50fe0a8e5f5f4f6a0c0f6b4284ab1c59c1e OP_EQUALVERIFY OP_CHECKSIG";
        let err = parse_contract_asm(&tokenize(asm)).unwrap_err();
        assert_eq!(
            err,
            AsmError::UnexpectedToken {
                position: 4,
                expected: "OP_CALL or OP_CREATE",
                found: "OP_CHECKSIG".into(),
            }
        );
    }

    #[test]
    fn test_empty_stream() {
        let tokens: Vec<&str> = Vec::new();
        assert_eq!(parse_contract_asm(&tokens).unwrap_err(), AsmError::Empty);
        assert_eq!(parse_call_asm(&tokens).unwrap_err(), AsmError::Empty);
    }

    #[test]
    fn test_token_count_mismatch() {
        let asm = format!("4 90d003 28 {} OP_CALL", CALL_DATA);
        let err = parse_call_asm(&tokenize(&asm)).unwrap_err();
        assert_eq!(
            err,
            AsmError::TokenCount {
                shape: "call",
                expected: 6,
                got: 5,
            }
        );
    }

    #[test]
    fn test_wrong_marker_position() {
        let asm = CALL_SENDER_ASM.replace("OP_SENDER", "OP_NOP");
        let err = parse_call_sender_asm(&tokenize(&asm)).unwrap_err();
        assert_eq!(
            err,
            AsmError::UnexpectedToken {
                position: 3,
                expected: OP_SENDER,
                found: "OP_NOP".into(),
            }
        );
    }

    #[test]
    fn test_call_parser_rejects_create_script() {
        let err = parse_call_sender_asm(&tokenize(CREATE_SENDER_ASM)).unwrap_err();
        assert!(matches!(err, AsmError::TokenCount { expected: 10, got: 9, .. }));
    }

    #[test]
    fn test_non_hex_field() {
        let asm = format!("4 90d003 2g {} {} OP_CALL", CALL_DATA, CALL_CONTRACT);
        let err = parse_call_asm(&tokenize(&asm)).unwrap_err();
        assert_eq!(
            err,
            AsmError::InvalidHex {
                field: "gas price",
                position: 2,
                token: "2g".into(),
            }
        );
    }

    #[test]
    fn test_odd_length_gas_limit() {
        let asm = format!("4 0d003 28 {} {} OP_CALL", CALL_DATA, CALL_CONTRACT);
        let err = parse_call_asm(&tokenize(&asm)).unwrap_err();
        assert_eq!(
            err,
            AsmError::OddLength {
                field: "gas limit",
                position: 1,
                len: 5,
            }
        );
    }

    #[test]
    fn test_short_contract_address() {
        let asm = format!("4 90d003 28 {} 54fefdb5 OP_CALL", CALL_DATA);
        let err = parse_call_asm(&tokenize(&asm)).unwrap_err();
        assert_eq!(
            err,
            AsmError::AddressLength {
                field: "contract address",
                position: 4,
                len: 8,
            }
        );
    }

    #[test]
    fn test_reverse_byte_pairs() {
        assert_eq!(reverse_byte_pairs("90d003").unwrap(), "03d090");
        assert_eq!(reverse_byte_pairs("b79166").unwrap(), "6691b7");
        assert_eq!(reverse_byte_pairs("").unwrap(), "");
        assert_eq!(reverse_byte_pairs("AbCd").unwrap(), "CdAb");
        assert!(reverse_byte_pairs("abc").is_err());
        assert!(reverse_byte_pairs("zz").is_err());
    }

    #[test]
    fn test_reverse_byte_pairs_is_involution() {
        for hex_str in ["90d003", "a02526", "00", "0000ff", "DEADbeef", CALL_DATA] {
            let twice = reverse_byte_pairs(&reverse_byte_pairs(hex_str).unwrap()).unwrap();
            assert_eq!(twice, hex_str);
        }
    }

    #[test]
    fn test_zero_gas_limit() {
        let info = parse_call_asm(&["4", "0000", "28", "00", CALL_CONTRACT, "OP_CALL"]).unwrap();
        assert_eq!(info.gas_limit, "0");
    }
}
