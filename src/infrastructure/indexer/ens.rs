//! ENS name resolution over `eth_call`
//!
//! The registry is walked from the full name towards the root until a
//! resolver is found. A resolver set on a parent only answers for the full
//! name when it implements ENSIP-10 wildcard resolution.

use alloy_primitives::{address, keccak256, Address, Bytes, FixedBytes, B256};
use alloy_sol_types::{sol, SolCall};
use anyhow::{bail, Context, Result};
use tracing::debug;

/// ENS registry, same address on mainnet and Sepolia
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// ERC-165 interface id of `resolve(bytes,bytes)`
pub const EXTENDED_RESOLVER_ID: FixedBytes<4> = FixedBytes([0x90, 0x61, 0xb9, 0x23]);

sol! {
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    interface IAddrResolver {
        function addr(bytes32 node) external view returns (address);
    }

    interface IERC165 {
        function supportsInterface(bytes4 interfaceID) external view returns (bool);
    }

    interface IExtendedResolver {
        function resolve(bytes name, bytes data) external view returns (bytes);
    }
}

/// Read-only contract calls against the latest block
#[async_trait::async_trait]
pub trait EthCall: Send + Sync {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Bytes>;
}

/// Resolve a normalized name to its address; `None` when nothing is set
pub async fn resolve_name<C>(client: &C, name: &str) -> Result<Option<Address>>
where
    C: EthCall + ?Sized,
{
    let Some((resolver, owner_name)) = find_resolver(client, name).await? else {
        debug!(name, "no ENS resolver set");
        return Ok(None);
    };

    let node = namehash(name);
    let address = if owner_name == name {
        let reply = client
            .call(resolver, addr_calldata(node))
            .await
            .context("ENS resolver lookup failed")?;
        decode_address_word(&reply)?
    } else {
        if !supports_wildcard(client, resolver).await {
            debug!(name, parent = owner_name, "parent resolver has no wildcard support");
            return Ok(None);
        }
        let data = wildcard_calldata(name, node)?;
        let reply = client
            .call(resolver, data)
            .await
            .context("ENS wildcard resolution failed")?;
        let inner = IExtendedResolver::resolveCall::abi_decode_returns(&reply)
            .context("Invalid ENS wildcard response")?;
        decode_address_word(&inner)?
    };

    Ok((!address.is_zero()).then_some(address))
}

/// Nearest name, starting at `name` itself, that has a resolver set
async fn find_resolver<'n, C>(client: &C, name: &'n str) -> Result<Option<(Address, &'n str)>>
where
    C: EthCall + ?Sized,
{
    let mut current = name;
    // Stop before the TLD unless the TLD itself was asked for
    while !current.is_empty() && (current != "eth" || name == "eth") {
        let reply = client
            .call(ENS_REGISTRY, resolver_calldata(namehash(current)))
            .await
            .context("ENS registry lookup failed")?;
        let resolver = decode_address_word(&reply)?;
        if !resolver.is_zero() {
            return Ok(Some((resolver, current)));
        }
        current = current.split_once('.').map_or("", |(_, parent)| parent);
    }
    Ok(None)
}

async fn supports_wildcard<C>(client: &C, resolver: Address) -> bool
where
    C: EthCall + ?Sized,
{
    let data = IERC165::supportsInterfaceCall {
        interfaceID: EXTENDED_RESOLVER_ID,
    }
    .abi_encode();
    match client.call(resolver, data).await {
        Ok(reply) => IERC165::supportsInterfaceCall::abi_decode_returns(&reply).unwrap_or(false),
        Err(err) => {
            // Reverts count as "not supported"
            debug!(resolver = %resolver, "supportsInterface failed: {:#}", err);
            false
        }
    }
}

/// EIP-137 namehash of an already normalized name
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// DNS wire format of a name, as ENSIP-10 `resolve` expects it
pub fn dns_encode(name: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.').filter(|label| !label.is_empty()) {
        if label.len() > 63 {
            bail!("ENS label longer than 63 bytes: {}", label);
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(out)
}

/// Calldata for `registry.resolver(node)`
pub fn resolver_calldata(node: B256) -> Vec<u8> {
    IEnsRegistry::resolverCall { node }.abi_encode()
}

/// Calldata for `resolver.addr(node)`
pub fn addr_calldata(node: B256) -> Vec<u8> {
    IAddrResolver::addrCall { node }.abi_encode()
}

/// Calldata for `resolver.resolve(dnsName, addr(node))`
pub fn wildcard_calldata(name: &str, node: B256) -> Result<Vec<u8>> {
    Ok(IExtendedResolver::resolveCall {
        name: dns_encode(name)?.into(),
        data: addr_calldata(node).into(),
    }
    .abi_encode())
}

/// Decode call output holding a single ABI-encoded address
pub fn decode_address_word(data: &[u8]) -> Result<Address> {
    if data.is_empty() {
        // Calls into an address without code return empty data
        return Ok(Address::ZERO);
    }
    if data.len() < 32 {
        bail!("eth_call result too short ({} bytes)", data.len());
    }
    Ok(Address::from_slice(&data[12..32]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Contract calls answered from a fixed table; anything else returns empty data
    #[derive(Default)]
    struct FakeChain {
        replies: HashMap<(Address, Vec<u8>), Bytes>,
        reverting: Vec<Address>,
        calls: Mutex<Vec<Address>>,
    }

    impl FakeChain {
        fn with_resolver(mut self, name: &str, resolver: Address) -> Self {
            self.replies.insert(
                (ENS_REGISTRY, resolver_calldata(namehash(name))),
                Bytes::from(resolver.into_word().to_vec()),
            );
            self
        }

        fn with_addr(mut self, resolver: Address, name: &str, target: Address) -> Self {
            self.replies.insert(
                (resolver, addr_calldata(namehash(name))),
                Bytes::from(target.into_word().to_vec()),
            );
            self
        }

        fn with_wildcard(mut self, resolver: Address, name: &str, target: Address) -> Self {
            let support = IERC165::supportsInterfaceCall {
                interfaceID: EXTENDED_RESOLVER_ID,
            }
            .abi_encode();
            self.replies.insert(
                (resolver, support),
                Bytes::from(IERC165::supportsInterfaceCall::abi_encode_returns(&true)),
            );
            let answer = Bytes::from(target.into_word().to_vec());
            self.replies.insert(
                (resolver, wildcard_calldata(name, namehash(name)).unwrap()),
                Bytes::from(IExtendedResolver::resolveCall::abi_encode_returns(&answer)),
            );
            self
        }

        fn reverting(mut self, contract: Address) -> Self {
            self.reverting.push(contract);
            self
        }

        fn registry_calls(&self) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|to| **to == ENS_REGISTRY)
                .count()
        }
    }

    #[async_trait::async_trait]
    impl EthCall for FakeChain {
        async fn call(&self, to: Address, data: Vec<u8>) -> Result<Bytes> {
            self.calls.lock().unwrap().push(to);
            if self.reverting.contains(&to) {
                bail!("execution reverted");
            }
            Ok(self.replies.get(&(to, data)).cloned().unwrap_or_default())
        }
    }

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            format!("{:?}", namehash("eth")),
            "0x93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            format!("{:?}", namehash("foo.eth")),
            "0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn test_calldata_layout() {
        let node = namehash("foo.eth");

        let data = resolver_calldata(node);
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &keccak256("resolver(bytes32)")[..4]);
        assert_eq!(&data[4..], node.as_slice());

        let data = addr_calldata(node);
        assert_eq!(&data[..4], &[0x3b, 0x3b, 0x57, 0xde]);

        assert_eq!(IExtendedResolver::resolveCall::SELECTOR, EXTENDED_RESOLVER_ID.0);
        let data = wildcard_calldata("foo.eth", node).unwrap();
        assert_eq!(&data[..4], EXTENDED_RESOLVER_ID.as_slice());
    }

    #[test]
    fn test_dns_encode() {
        assert_eq!(dns_encode("").unwrap(), vec![0]);
        assert_eq!(
            dns_encode("sub.foo.eth").unwrap(),
            b"\x03sub\x03foo\x03eth\x00".to_vec()
        );
        assert!(dns_encode(&format!("{}.eth", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_decode_address_word() {
        let word = hex::decode("000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045")
            .unwrap();
        assert_eq!(
            decode_address_word(&word).unwrap(),
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse::<Address>().unwrap()
        );
        assert_eq!(decode_address_word(&[]).unwrap(), Address::ZERO);
        assert!(decode_address_word(&[0x12, 0x34]).is_err());
    }

    #[tokio::test]
    async fn test_resolver_on_the_name_itself() {
        let (resolver, target) = (addr(0x11), addr(0x22));
        let chain = FakeChain::default()
            .with_resolver("foo.eth", resolver)
            .with_addr(resolver, "foo.eth", target);

        assert_eq!(resolve_name(&chain, "foo.eth").await.unwrap(), Some(target));
        assert_eq!(chain.registry_calls(), 1);
    }

    #[tokio::test]
    async fn test_subname_resolves_through_wildcard_parent() {
        let (resolver, target) = (addr(0x33), addr(0x44));
        let chain = FakeChain::default()
            .with_resolver("foo.eth", resolver)
            .with_wildcard(resolver, "pay.foo.eth", target);

        assert_eq!(resolve_name(&chain, "pay.foo.eth").await.unwrap(), Some(target));
        // pay.foo.eth then foo.eth
        assert_eq!(chain.registry_calls(), 2);
    }

    #[tokio::test]
    async fn test_parent_without_wildcard_support_resolves_nothing() {
        let resolver = addr(0x55);
        let chain = FakeChain::default()
            .with_resolver("foo.eth", resolver)
            .with_addr(resolver, "foo.eth", addr(0x66));
        assert_eq!(resolve_name(&chain, "pay.foo.eth").await.unwrap(), None);

        let chain = FakeChain::default()
            .with_resolver("foo.eth", resolver)
            .reverting(resolver);
        assert_eq!(resolve_name(&chain, "pay.foo.eth").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_walk_stops_before_the_tld() {
        let chain = FakeChain::default().with_resolver("eth", addr(0x77));

        assert_eq!(resolve_name(&chain, "a.b.eth").await.unwrap(), None);
        // a.b.eth and b.eth only
        assert_eq!(chain.registry_calls(), 2);
    }

    #[tokio::test]
    async fn test_registry_failure_is_an_error() {
        let chain = FakeChain::default().reverting(ENS_REGISTRY);
        let err = resolve_name(&chain, "foo.eth").await.unwrap_err();
        assert!(format!("{:#}", err).contains("ENS registry lookup failed"));
    }
}
