//! Closed registry of the runtime calls the wallet can build.
//!
//! A request names a module and a function; both are resolved against a
//! fixed table keyed by runtime profile, and the arguments are encoded
//! from JSON by declared kind. Anything not in the table is rejected
//! before a byte is signed.

use meshwallet_core::{parse_amount_value, BaseUnits, ChainFamily, RuntimeProfile, SubstrateParams};
use meshwallet_error::{Result, WalletError};
use meshwallet_traits::PolkadotTransactionRequest;
use serde_json::Value;

use crate::scale::{encode_bytes, encode_compact};
use crate::ss58;

/// How a JSON argument is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// SS58 address or 0x-hex account id, encoded as `MultiAddress::Id`
    AccountId,
    /// Base-unit integer, compact encoded
    Balance,
    /// 0x-hex or UTF-8 text, length prefixed
    Bytes,
    /// Asset id, compact encoded
    AssetId,
    /// `true` / `false`
    Bool,
}

#[derive(Debug)]
struct CallSpec {
    pallet: &'static str,
    name: &'static str,
    index: u8,
    args: &'static [ArgKind],
}

const CALLS: &[CallSpec] = &[
    CallSpec {
        pallet: "system",
        name: "remark",
        index: 0,
        args: &[ArgKind::Bytes],
    },
    CallSpec {
        pallet: "system",
        name: "remark_with_event",
        index: 7,
        args: &[ArgKind::Bytes],
    },
    CallSpec {
        pallet: "balances",
        name: "transfer_allow_death",
        index: 0,
        args: &[ArgKind::AccountId, ArgKind::Balance],
    },
    CallSpec {
        pallet: "balances",
        name: "transfer_keep_alive",
        index: 3,
        args: &[ArgKind::AccountId, ArgKind::Balance],
    },
    CallSpec {
        pallet: "balances",
        name: "transfer_all",
        index: 4,
        args: &[ArgKind::AccountId, ArgKind::Bool],
    },
    CallSpec {
        pallet: "assets",
        name: "transfer",
        index: 8,
        args: &[ArgKind::AssetId, ArgKind::AccountId, ArgKind::Balance],
    },
    CallSpec {
        pallet: "assets",
        name: "transfer_keep_alive",
        index: 9,
        args: &[ArgKind::AssetId, ArgKind::AccountId, ArgKind::Balance],
    },
];

fn pallet_index(profile: RuntimeProfile, pallet: &str) -> Option<u8> {
    use RuntimeProfile::*;
    match (pallet, profile) {
        ("system", _) => Some(0),
        ("balances", Polkadot) => Some(5),
        ("balances", Kusama | Westend) => Some(4),
        ("balances", PolkadotAssetHub) => Some(10),
        ("assets", PolkadotAssetHub) => Some(50),
        _ => None,
    }
}

/// `transferKeepAlive` -> `transfer_keep_alive`, `Balances` -> `balances`
fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.trim().chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// An encoded call ready to be wrapped in an extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    /// Resolved pallet name
    pub module: String,
    /// Resolved function name
    pub function: &'static str,
    /// `pallet_index ++ call_index ++ args`
    pub bytes: Vec<u8>,
}

/// Resolves and encodes a request against a network's runtime.
///
/// On the primary network `balances.transfer` is a shortcut for
/// `transfer_keep_alive(dest, amount)` with a human decimal amount.
/// Everywhere else arguments are taken as given, balances in base units.
pub fn build_call(
    params: &SubstrateParams,
    decimals: u32,
    request: &PolkadotTransactionRequest,
) -> Result<EncodedCall> {
    let module = normalize(&request.method);
    let function = match request.params.first() {
        Some(Value::String(name)) => normalize(name),
        Some(other) => {
            return Err(WalletError::InvalidArgument(format!(
                "function name must be a string, got {other}"
            )))
        }
        None => {
            return Err(WalletError::InvalidArgument(
                "params must start with the function name".into(),
            ))
        }
    };
    let args = &request.params[1..];

    let pallet = pallet_index(params.runtime, &module)
        .ok_or_else(|| WalletError::ModuleNotFound(request.method.clone()))?;

    if params.primary && module == "balances" && function == "transfer" {
        let [dest, amount] = args else {
            return Err(arity_error("balances.transfer", 2, args.len()));
        };
        let value = parse_amount_value(amount, ChainFamily::Substrate, decimals)?;
        let entry = find("balances", "transfer_keep_alive")?;
        let mut bytes = vec![pallet, entry.index];
        encode_arg(ArgKind::AccountId, dest, &mut bytes)?;
        encode_arg(ArgKind::Balance, &Value::String(value), &mut bytes)?;
        return Ok(EncodedCall {
            module,
            function: entry.name,
            bytes,
        });
    }

    let entry = CALLS
        .iter()
        .find(|c| c.pallet == module && c.name == function)
        .ok_or_else(|| WalletError::MethodNotFound {
            module: request.method.clone(),
            method: function.clone(),
        })?;
    if args.len() != entry.args.len() {
        return Err(arity_error(
            &format!("{}.{}", entry.pallet, entry.name),
            entry.args.len(),
            args.len(),
        ));
    }

    let mut bytes = vec![pallet, entry.index];
    for (kind, value) in entry.args.iter().zip(args) {
        encode_arg(*kind, value, &mut bytes)?;
    }
    Ok(EncodedCall {
        module,
        function: entry.name,
        bytes,
    })
}

fn find(pallet: &str, name: &str) -> Result<&'static CallSpec> {
    CALLS
        .iter()
        .find(|c| c.pallet == pallet && c.name == name)
        .ok_or_else(|| WalletError::MethodNotFound {
            module: pallet.to_string(),
            method: name.to_string(),
        })
}

fn arity_error(call: &str, expected: usize, got: usize) -> WalletError {
    WalletError::InvalidArgument(format!("{call} takes {expected} arguments, got {got}"))
}

fn encode_arg(kind: ArgKind, value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match kind {
        ArgKind::AccountId => {
            let account = parse_account(value)?;
            out.push(0x00); // MultiAddress::Id
            out.extend_from_slice(&account);
        }
        ArgKind::Balance => encode_compact(parse_integer(value, "balance")?, out),
        ArgKind::AssetId => {
            let id = parse_integer(value, "asset id")?;
            let id = u32::try_from(id).map_err(|_| {
                WalletError::InvalidArgument(format!("asset id {id} does not fit in u32"))
            })?;
            encode_compact(u128::from(id), out);
        }
        ArgKind::Bytes => {
            let text = value.as_str().ok_or_else(|| {
                WalletError::InvalidArgument(format!("expected a string, got {value}"))
            })?;
            match text.strip_prefix("0x") {
                Some(hex_str) => encode_bytes(&hex::decode(hex_str)?, out),
                None => encode_bytes(text.as_bytes(), out),
            }
        }
        ArgKind::Bool => {
            let flag = value.as_bool().ok_or_else(|| {
                WalletError::InvalidArgument(format!("expected a boolean, got {value}"))
            })?;
            out.push(u8::from(flag));
        }
    }
    Ok(())
}

/// Account id from an SS58 address (any format) or 32 bytes of 0x-hex
pub fn parse_account(value: &Value) -> Result<[u8; 32]> {
    let text = value.as_str().ok_or_else(|| {
        WalletError::InvalidArgument(format!("expected an address string, got {value}"))
    })?;
    match text.strip_prefix("0x") {
        Some(hex_str) => {
            let bytes = hex::decode(hex_str)?;
            bytes
                .try_into()
                .map_err(|_| WalletError::invalid_address(text, "account id must be 32 bytes"))
        }
        None => ss58::decode(text).map(|(_, account)| account),
    }
}

fn parse_integer(value: &Value, what: &str) -> Result<u128> {
    let units: BaseUnits = match value {
        Value::String(s) => s.trim().parse()?,
        Value::Number(n) => match n.as_u64() {
            Some(n) => BaseUnits::from(n),
            None => {
                return Err(WalletError::InvalidArgument(format!(
                    "{what} must be a non-negative integer, got {n}"
                )))
            }
        },
        other => {
            return Err(WalletError::InvalidArgument(format!(
                "{what} must be an integer, got {other}"
            )))
        }
    };
    units.to_u128()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::compact;
    use meshwallet_testing::KnownVectors;
    use serde_json::json;

    fn params(runtime: RuntimeProfile, primary: bool) -> SubstrateParams {
        SubstrateParams {
            ss58_format: 42,
            genesis_hash: "0x00".into(),
            runtime,
            primary,
        }
    }

    fn request(module: &str, function: &str, args: Vec<Value>) -> PolkadotTransactionRequest {
        PolkadotTransactionRequest::new(module, function, args)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("transferKeepAlive"), "transfer_keep_alive");
        assert_eq!(normalize("Balances"), "balances");
        assert_eq!(normalize("transfer_all"), "transfer_all");
    }

    #[test]
    fn test_generic_transfer_keep_alive() {
        let dest = KnownVectors::SUBSTRATE_DEV_SS58_42;
        let call = build_call(
            &params(RuntimeProfile::Westend, false),
            12,
            &request("balances", "transferKeepAlive", vec![json!(dest), json!("1000")]),
        )
        .unwrap();

        let mut expected = vec![4, 3, 0];
        expected.extend_from_slice(&KnownVectors::substrate_dev_public());
        expected.extend(compact(1000));
        assert_eq!(call.bytes, expected);
        assert_eq!(call.function, "transfer_keep_alive");
    }

    #[test]
    fn test_primary_transfer_takes_human_amount() {
        let dest = KnownVectors::SUBSTRATE_DEV_SS58_42;
        let call = build_call(
            &params(RuntimeProfile::Polkadot, true),
            10,
            &request("balances", "transfer", vec![json!(dest), json!("1.5")]),
        )
        .unwrap();

        let mut expected = vec![5, 3, 0];
        expected.extend_from_slice(&KnownVectors::substrate_dev_public());
        expected.extend(compact(15_000_000_000));
        assert_eq!(call.bytes, expected);
    }

    #[test]
    fn test_transfer_is_not_a_generic_call() {
        let err = build_call(
            &params(RuntimeProfile::Westend, false),
            12,
            &request("balances", "transfer", vec![json!("x"), json!("1")]),
        )
        .unwrap_err();
        assert!(matches!(err, WalletError::MethodNotFound { .. }));
    }

    #[test]
    fn test_unknown_module_and_method() {
        let westend = params(RuntimeProfile::Westend, false);
        let err = build_call(&westend, 12, &request("staking", "bond", vec![])).unwrap_err();
        assert!(matches!(err, WalletError::ModuleNotFound(m) if m == "staking"));

        // assets only exists on Asset Hub
        let err = build_call(&westend, 12, &request("assets", "transfer", vec![])).unwrap_err();
        assert!(matches!(err, WalletError::ModuleNotFound(_)));

        let err = build_call(&westend, 12, &request("balances", "burn", vec![])).unwrap_err();
        assert!(matches!(err, WalletError::MethodNotFound { method, .. } if method == "burn"));
    }

    #[test]
    fn test_wrong_arity() {
        let err = build_call(
            &params(RuntimeProfile::Kusama, false),
            12,
            &request("balances", "transfer_keep_alive", vec![json!("1")]),
        )
        .unwrap_err();
        assert!(matches!(err, WalletError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_function_name() {
        let req = PolkadotTransactionRequest {
            method: "balances".into(),
            params: vec![],
        };
        let err = build_call(&params(RuntimeProfile::Kusama, false), 12, &req).unwrap_err();
        assert!(matches!(err, WalletError::InvalidArgument(_)));
    }

    #[test]
    fn test_asset_transfer_on_asset_hub() {
        let dest = format!("0x{}", KnownVectors::SUBSTRATE_DEV_PUBLIC);
        let call = build_call(
            &params(RuntimeProfile::PolkadotAssetHub, false),
            10,
            &request("assets", "transfer", vec![json!(1984), json!(dest), json!(2_500_000)]),
        )
        .unwrap();
        let mut expected = vec![50, 8];
        expected.extend(compact(1984));
        expected.push(0);
        expected.extend_from_slice(&KnownVectors::substrate_dev_public());
        expected.extend(compact(2_500_000));
        assert_eq!(call.bytes, expected);
    }

    #[test]
    fn test_remark_and_transfer_all() {
        let westend = params(RuntimeProfile::Westend, false);
        let call = build_call(&westend, 12, &request("system", "remark", vec![json!("hi")])).unwrap();
        assert_eq!(call.bytes, vec![0, 0, 0x08, b'h', b'i']);

        let call = build_call(
            &westend,
            12,
            &request("system", "remarkWithEvent", vec![json!("0xdead")]),
        )
        .unwrap();
        assert_eq!(call.bytes, vec![0, 7, 0x08, 0xde, 0xad]);

        let dest = KnownVectors::SUBSTRATE_DEV_SS58_42;
        let call = build_call(
            &westend,
            12,
            &request("balances", "transfer_all", vec![json!(dest), json!(true)]),
        )
        .unwrap();
        assert_eq!(call.bytes.last(), Some(&1));
        assert_eq!(call.bytes.len(), 2 + 33 + 1);
    }

    #[test]
    fn test_bad_arguments() {
        let westend = params(RuntimeProfile::Westend, false);
        for args in [
            vec![json!("not-an-address"), json!("1")],
            vec![json!("0x1234"), json!("1")],
            vec![json!(KnownVectors::SUBSTRATE_DEV_SS58_42), json!("1.5")],
            vec![json!(KnownVectors::SUBSTRATE_DEV_SS58_42), json!(-1)],
        ] {
            assert!(
                build_call(&westend, 12, &request("balances", "transfer_keep_alive", args.clone()))
                    .is_err(),
                "{args:?} should be rejected"
            );
        }
    }
}
