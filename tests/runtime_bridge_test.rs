//! End-to-end through the runtime bridge: commands in, events out

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{addr, balance, meta, MockIndexer, MockWallet};
use erc20_indexer::domain::{LookupError, RequestId};
use erc20_indexer::infrastructure::{
    LookupOptions, NoWalletConnector, RuntimeBridge, RuntimeCommand, RuntimeEvent, WalletSession,
};

fn wait_for_events(bridge: &RuntimeBridge, count: usize) -> Vec<RuntimeEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while events.len() < count && Instant::now() < deadline {
        events.extend(bridge.poll_events());
        thread::sleep(Duration::from_millis(10));
    }
    events
}

#[test]
fn test_lookup_round_trip() {
    let owner = addr(0xaa);
    let token = addr(0x01);
    let api = Arc::new(
        MockIndexer::new()
            .with_balances(owner, vec![balance(token, 250)])
            .with_token(token, meta("TKN", 2)),
    );
    let bridge = RuntimeBridge::new(
        api,
        LookupOptions::default(),
        WalletSession::new(Box::new(NoWalletConnector)),
    )
    .expect("bridge starts");

    bridge
        .send(RuntimeCommand::Lookup {
            request: RequestId(7),
            query: owner.to_checksum(None),
        })
        .expect("worker is running");

    let events = wait_for_events(&bridge, 1);
    match events.as_slice() {
        [RuntimeEvent::LookupFinished { request, result: Ok(outcome) }] => {
            assert_eq!(*request, RequestId(7));
            assert_eq!(outcome.rows[0].balance, "2.5");
        }
        other => panic!("unexpected events: {:?}", other),
    }
}

#[test]
fn test_slow_lookup_does_not_block_newer_one() {
    let (slow_owner, fast_owner) = (addr(0xb1), addr(0xb2));
    let slow_token = addr(0x11);
    let api = Arc::new(
        MockIndexer::new()
            .with_balances(slow_owner, vec![balance(slow_token, 1)])
            .with_token(slow_token, meta("SLOW", 0))
            .with_metadata_delay(slow_token, Duration::from_millis(400))
            .with_balances(fast_owner, Vec::new()),
    );
    let bridge = RuntimeBridge::new(
        api,
        LookupOptions::default(),
        WalletSession::new(Box::new(NoWalletConnector)),
    )
    .expect("bridge starts");

    bridge
        .send(RuntimeCommand::Lookup {
            request: RequestId(1),
            query: slow_owner.to_checksum(None),
        })
        .expect("send");
    bridge
        .send(RuntimeCommand::Lookup {
            request: RequestId(2),
            query: fast_owner.to_checksum(None),
        })
        .expect("send");

    let events = wait_for_events(&bridge, 2);
    let order: Vec<RequestId> = events
        .iter()
        .filter_map(|event| match event {
            RuntimeEvent::LookupFinished { request, .. } => Some(*request),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec![RequestId(2), RequestId(1)]);
}

#[test]
fn test_invalid_query_reports_failure() {
    let bridge = RuntimeBridge::new(
        Arc::new(MockIndexer::new()),
        LookupOptions::default(),
        WalletSession::new(Box::new(NoWalletConnector)),
    )
    .expect("bridge starts");

    bridge
        .send(RuntimeCommand::Lookup {
            request: RequestId(1),
            query: "not valid".to_string(),
        })
        .expect("send");

    let events = wait_for_events(&bridge, 1);
    assert!(matches!(
        events.as_slice(),
        [RuntimeEvent::LookupFinished {
            result: Err(LookupError::InvalidQuery(_)),
            ..
        }]
    ));
}

#[test]
fn test_wallet_commands_produce_events() {
    let account = addr(0x42);
    let bridge = RuntimeBridge::new(
        Arc::new(MockIndexer::new()),
        LookupOptions::default(),
        WalletSession::new(Box::new(MockWallet::granting(vec![account]))),
    )
    .expect("bridge starts");

    bridge.send(RuntimeCommand::ConnectWallet).expect("send");
    let events = wait_for_events(&bridge, 1);
    match events.as_slice() {
        [RuntimeEvent::WalletConnected { accounts }] => {
            assert_eq!(accounts, &vec![account.to_checksum(None)]);
        }
        other => panic!("unexpected events: {:?}", other),
    }

    bridge.send(RuntimeCommand::DisconnectWallet).expect("send");
    let events = wait_for_events(&bridge, 1);
    assert!(matches!(events.as_slice(), [RuntimeEvent::WalletDisconnected]));
}

#[test]
fn test_missing_wallet_reports_failure_event() {
    let bridge = RuntimeBridge::new(
        Arc::new(MockIndexer::new()),
        LookupOptions::default(),
        WalletSession::new(Box::new(NoWalletConnector)),
    )
    .expect("bridge starts");

    bridge.send(RuntimeCommand::ConnectWallet).expect("send");
    let events = wait_for_events(&bridge, 1);
    assert!(matches!(
        events.as_slice(),
        [RuntimeEvent::WalletFailed {
            error: LookupError::WalletUnavailable(_)
        }]
    ));
}
