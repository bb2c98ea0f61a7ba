//! Loading and placeholder resolution of the UniversalRouter constructor parameters
//!
//! Parameter files mark protocols that are unsupported on a network with the
//! zero address. Inside the scripts that sentinel is represented as
//! [`SlotValue::Unresolved`], so a zero value is never mistaken for a real
//! integration address. Conversion to and from the zero address happens only
//! at the file boundary.

use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use alloy::dyn_abi::DynSolValue;
use alloy_primitives::{Address, B256};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    constants::{ADDRESS_HEX_LEN, HASH_HEX_LEN, NUM_BYTES_HASH},
    errors::ScriptError,
};

// ---------
// | Slots |
// ---------

/// An address-typed router parameter.
///
/// Declaration order matches the Solidity `RouterParameters` struct.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressSlot {
    /// The Permit2 contract
    Permit2,
    /// The WETH9 token
    Weth9,
    /// The Seaport marketplace
    Seaport,
    /// The NFTX zap
    NftxZap,
    /// The X2Y2 marketplace
    X2y2,
    /// The Foundation marketplace
    Foundation,
    /// The Sudoswap pair router
    Sudoswap,
    /// The NFT20 zap
    Nft20Zap,
    /// The CryptoPunks market
    Cryptopunks,
    /// The LooksRare exchange
    LooksRare,
    /// The router rewards distributor
    RouterRewardsDistributor,
    /// The LooksRare rewards distributor
    LooksRareRewardsDistributor,
    /// The LooksRare token
    LooksRareToken,
    /// The Uniswap v2 factory
    V2Factory,
    /// The Uniswap v3 factory
    V3Factory,
}

impl AddressSlot {
    /// Every address slot, in struct order
    pub const ALL: [AddressSlot; 15] = [
        AddressSlot::Permit2,
        AddressSlot::Weth9,
        AddressSlot::Seaport,
        AddressSlot::NftxZap,
        AddressSlot::X2y2,
        AddressSlot::Foundation,
        AddressSlot::Sudoswap,
        AddressSlot::Nft20Zap,
        AddressSlot::Cryptopunks,
        AddressSlot::LooksRare,
        AddressSlot::RouterRewardsDistributor,
        AddressSlot::LooksRareRewardsDistributor,
        AddressSlot::LooksRareToken,
        AddressSlot::V2Factory,
        AddressSlot::V3Factory,
    ];

    /// The key of the slot in a parameter file
    pub fn key(&self) -> &'static str {
        match self {
            AddressSlot::Permit2 => "permit2",
            AddressSlot::Weth9 => "weth9",
            AddressSlot::Seaport => "seaport",
            AddressSlot::NftxZap => "nftxZap",
            AddressSlot::X2y2 => "x2y2",
            AddressSlot::Foundation => "foundation",
            AddressSlot::Sudoswap => "sudoswap",
            AddressSlot::Nft20Zap => "nft20Zap",
            AddressSlot::Cryptopunks => "cryptopunks",
            AddressSlot::LooksRare => "looksRare",
            AddressSlot::RouterRewardsDistributor => "routerRewardsDistributor",
            AddressSlot::LooksRareRewardsDistributor => "looksRareRewardsDistributor",
            AddressSlot::LooksRareToken => "looksRareToken",
            AddressSlot::V2Factory => "v2Factory",
            AddressSlot::V3Factory => "v3Factory",
        }
    }

    /// Look up a slot by its parameter file key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

/// A hash-constant router parameter, never substituted
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashSlot {
    /// The Uniswap v2 pair init code hash
    PairInitCodeHash,
    /// The Uniswap v3 pool init code hash
    PoolInitCodeHash,
}

impl HashSlot {
    /// Every hash slot, in struct order
    pub const ALL: [HashSlot; 2] = [HashSlot::PairInitCodeHash, HashSlot::PoolInitCodeHash];

    /// The key of the slot in a parameter file
    pub fn key(&self) -> &'static str {
        match self {
            HashSlot::PairInitCodeHash => "pairInitCodeHash",
            HashSlot::PoolInitCodeHash => "poolInitCodeHash",
        }
    }

    /// Look up a slot by its parameter file key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

/// The value held by an address slot
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SlotValue {
    /// The protocol is not supported on the target network
    Unresolved,
    /// The address of the protocol's contract
    Address(Address),
}

impl SlotValue {
    /// Convert an address read from a parameter file, treating the zero
    /// address as the unsupported sentinel
    pub fn from_raw(address: Address) -> Self {
        if address.is_zero() {
            SlotValue::Unresolved
        } else {
            SlotValue::Address(address)
        }
    }

    /// The address written back to a parameter file
    pub fn to_raw(&self) -> Address {
        match self {
            SlotValue::Unresolved => Address::ZERO,
            SlotValue::Address(address) => *address,
        }
    }

    /// Apply the substitution rule for a single slot
    pub fn resolve(&self, fallback: Address) -> Address {
        match self {
            SlotValue::Unresolved => fallback,
            SlotValue::Address(address) => *address,
        }
    }
}

// -----------------
// | Parameter Set |
// -----------------

/// The UniversalRouter constructor parameters, keyed by slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterParameterSet {
    /// The address slots present in the set
    addresses: BTreeMap<AddressSlot, SlotValue>,
    /// The hash slots present in the set
    hashes: BTreeMap<HashSlot, B256>,
}

impl RouterParameterSet {
    /// Set an address slot, replacing any previous value
    pub fn with_address(mut self, slot: AddressSlot, value: SlotValue) -> Self {
        self.addresses.insert(slot, value);
        self
    }

    /// Set a hash slot, replacing any previous value
    pub fn with_hash(mut self, slot: HashSlot, hash: B256) -> Self {
        self.hashes.insert(slot, hash);
        self
    }

    /// Remove an address slot
    pub fn without_address(mut self, slot: AddressSlot) -> Self {
        self.addresses.remove(&slot);
        self
    }

    /// The value of an address slot, if present
    pub fn address(&self, slot: AddressSlot) -> Option<SlotValue> {
        self.addresses.get(&slot).copied()
    }

    /// The value of a hash slot, if present
    pub fn hash(&self, slot: HashSlot) -> Option<B256> {
        self.hashes.get(&slot).copied()
    }

    /// Parse a parameter set from the contents of a parameter file.
    ///
    /// Slots absent from the file are absent from the set; completeness is
    /// checked when the set is resolved.
    pub fn from_json_str(contents: &str) -> Result<Self, ScriptError> {
        let raw: Map<String, Value> = serde_json::from_str(contents)
            .map_err(|e| ScriptError::ConfigurationError(e.to_string()))?;

        let mut params = RouterParameterSet::default();
        for (key, value) in raw.iter() {
            if let Some(slot) = AddressSlot::from_key(key) {
                let address = parse_address(key, value)?;
                params.addresses.insert(slot, SlotValue::from_raw(address));
            } else if let Some(slot) = HashSlot::from_key(key) {
                params.hashes.insert(slot, parse_hash(key, value)?);
            } else {
                warn!("ignoring unknown router parameter `{}`", key);
            }
        }

        Ok(params)
    }

    /// Ensure every required slot is present
    pub fn ensure_complete(&self) -> Result<(), ScriptError> {
        let missing_address = AddressSlot::ALL
            .iter()
            .find(|slot| !self.addresses.contains_key(*slot))
            .map(AddressSlot::key);
        let missing_hash = HashSlot::ALL
            .iter()
            .find(|slot| !self.hashes.contains_key(*slot))
            .map(HashSlot::key);

        match missing_address.or(missing_hash) {
            Some(key) => Err(ScriptError::ConfigurationError(format!(
                "missing router parameter `{}`",
                key
            ))),
            None => Ok(()),
        }
    }

    /// Encode the set as the router's constructor argument, a tuple laid
    /// out like the Solidity `RouterParameters` struct.
    ///
    /// Fails if the set is incomplete or still holds unresolved slots.
    pub fn to_constructor_arg(&self) -> Result<DynSolValue, ScriptError> {
        self.ensure_complete()?;

        let mut fields = Vec::with_capacity(AddressSlot::ALL.len() + HashSlot::ALL.len());
        for (slot, value) in self.addresses.iter() {
            match value {
                SlotValue::Address(address) => fields.push(DynSolValue::Address(*address)),
                SlotValue::Unresolved => {
                    return Err(ScriptError::ConfigurationError(format!(
                        "router parameter `{}` is unresolved",
                        slot.key()
                    )))
                }
            }
        }
        for hash in self.hashes.values() {
            fields.push(DynSolValue::FixedBytes(*hash, NUM_BYTES_HASH));
        }

        Ok(DynSolValue::Tuple(fields))
    }
}

/// Serializes to the parameter file shape, in struct order
impl Serialize for RouterParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.addresses.len() + self.hashes.len()))?;
        for (slot, value) in self.addresses.iter() {
            map.serialize_entry(slot.key(), &format!("{:#x}", value.to_raw()))?;
        }
        for (slot, hash) in self.hashes.iter() {
            map.serialize_entry(slot.key(), hash)?;
        }
        map.end()
    }
}

// --------------
// | Operations |
// --------------

/// Read a parameter set from the file at the given path
pub fn load_parameters(path: &Path) -> Result<RouterParameterSet, ScriptError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ScriptError::ConfigurationError(format!("could not read {}: {}", path.display(), e))
    })?;
    RouterParameterSet::from_json_str(&contents)
}

/// Substitute `fallback` into every unresolved address slot.
///
/// Hash slots and resolved address slots are copied unchanged. The set must
/// contain every slot, a missing one is a [`ScriptError::ConfigurationError`].
pub fn resolve(
    params: &RouterParameterSet,
    fallback: Address,
) -> Result<RouterParameterSet, ScriptError> {
    params.ensure_complete()?;
    if fallback.is_zero() {
        warn!("resolving router parameters against the zero address");
    }

    let addresses = params
        .addresses
        .iter()
        .map(|(slot, value)| (*slot, SlotValue::Address(value.resolve(fallback))))
        .collect();

    Ok(RouterParameterSet {
        addresses,
        hashes: params.hashes.clone(),
    })
}

// -----------
// | Helpers |
// -----------

/// Parse a `0x`-prefixed 20-byte address from a parameter file value
fn parse_address(key: &str, value: &Value) -> Result<Address, ScriptError> {
    let s = expect_hex_str(key, value, ADDRESS_HEX_LEN)?;
    Address::from_str(s).map_err(|e| {
        ScriptError::ConfigurationError(format!("invalid address for `{}`: {}", key, e))
    })
}

/// Parse a `0x`-prefixed 32-byte hash from a parameter file value
fn parse_hash(key: &str, value: &Value) -> Result<B256, ScriptError> {
    let s = expect_hex_str(key, value, HASH_HEX_LEN)?;
    B256::from_str(s)
        .map_err(|e| ScriptError::ConfigurationError(format!("invalid hash for `{}`: {}", key, e)))
}

/// Check that a value is a `0x`-prefixed string of the given length
fn expect_hex_str<'a>(key: &str, value: &'a Value, len: usize) -> Result<&'a str, ScriptError> {
    let s = value.as_str().ok_or_else(|| {
        ScriptError::ConfigurationError(format!("router parameter `{}` is not a string", key))
    })?;

    if !s.starts_with("0x") || s.len() != len {
        return Err(ScriptError::ConfigurationError(format!(
            "router parameter `{}` must be 0x-prefixed with {} hex digits, got `{}`",
            key,
            len - 2,
            s
        )));
    }

    Ok(s)
}
