//! End to end recordings checked line by line.

mod common;

use common::{block, buffered_lines, init_logger, last_field, tags, Capture};
use ethereum_types::{Address, Bloom, H256, U256};
use firehose::{
    BalanceChangeReason, CallType, Context, GasChangeReason, RawTransaction, TraceError,
    PROTOCOL_VERSION,
};
use firehose_common::{Log, Receipt};
use rstest::rstest;

fn in_transaction() -> Context {
    let mut ctx = Context::buffered(4096);
    ctx.start_block(&block(1)).unwrap();
    ctx.start_transaction_raw(RawTransaction::default()).unwrap();
    ctx
}

#[test]
fn simple_transfer_block() {
    init_logger();
    let capture = Capture::default();
    let mut ctx = Context::direct(capture.sink());

    let hash = H256::repeat_byte(0xaa);
    let to = Address::repeat_byte(0x02);
    let from = Address::from_low_u64_be(1);

    ctx.start_block(&block(1)).unwrap();
    ctx.start_transaction_raw(RawTransaction {
        hash,
        to: Some(&to),
        value: U256::from(1_000_000u64),
        v: U256::from(0x1b),
        r: U256::one(),
        s: U256::from(2),
        gas_limit: 21000,
        gas_price: U256::from(1_000_000_000u64),
        nonce: 5,
        ..Default::default()
    })
    .unwrap();
    ctx.record_trx_from(from).unwrap();
    ctx.start_call(CallType::Call).unwrap();
    ctx.record_storage_change(
        to,
        H256::from_low_u64_be(1),
        H256::zero(),
        H256::from_low_u64_be(0xff),
    )
    .unwrap();
    ctx.end_call(21000, &[]).unwrap();
    ctx.end_transaction(&Receipt {
        gas_used: 21000,
        cumulative_gas_used: 21000,
        logs_bloom: Bloom::zero(),
        ..Default::default()
    })
    .unwrap();
    ctx.end_block(&block(1), U256::from(100)).unwrap();

    let lines = capture.lines();
    assert_eq!(
        tags(&lines),
        [
            "BEGIN_BLOCK",
            "BEGIN_APPLY_TRX",
            "TRX_FROM",
            "EVM_RUN_CALL",
            "STORAGE_CHANGE",
            "EVM_END_CALL",
            "END_APPLY_TRX",
            "END_BLOCK",
        ]
    );

    assert_eq!(lines[0], "FIRE BEGIN_BLOCK 1");
    assert_eq!(
        lines[1],
        format!(
            "FIRE BEGIN_APPLY_TRX {} {} 0f4240 1b 01 02 21000 3b9aca00 5 . 00 . . 0 1 0",
            "aa".repeat(32),
            "02".repeat(20),
        )
    );
    assert_eq!(lines[2], format!("FIRE TRX_FROM {}01", "00".repeat(19)));
    assert_eq!(lines[3], "FIRE EVM_RUN_CALL CALL 1 2");
    assert_eq!(
        lines[4],
        format!(
            "FIRE STORAGE_CHANGE 1 {} {}01 {} {}ff 3",
            "02".repeat(20),
            "00".repeat(31),
            "00".repeat(32),
            "00".repeat(31),
        )
    );
    assert_eq!(lines[5], "FIRE EVM_END_CALL 1 21000 . 4");
    assert_eq!(
        lines[6],
        format!("FIRE END_APPLY_TRX 21000 . 21000 {} 5 []", "00".repeat(256))
    );

    let end_block = lines[7].splitn(5, ' ').collect::<Vec<_>>();
    assert_eq!(end_block[2], "1");
    assert_eq!(end_block[3], block(1).size().to_string());
    let payload: serde_json::Value = serde_json::from_str(end_block[4]).unwrap();
    assert_eq!(payload["totalDifficulty"], "0x64");
    assert_eq!(payload["header"]["number"], "0x1");
    assert_eq!(
        payload["header"]["hash"],
        format!("{:?}", block(1).hash())
    );
    assert_eq!(payload["uncles"], serde_json::json!([]));

    assert!(!ctx.in_block());
    assert!(!ctx.in_transaction());
}

#[test]
fn init_banner() {
    let mut ctx = Context::buffered(64);
    ctx.init_version("1.10.8-fh", PROTOCOL_VERSION, "geth").unwrap();
    ctx.init_version("1.10.8-fh", PROTOCOL_VERSION, "geth").unwrap();

    assert_eq!(
        buffered_lines(&ctx),
        ["FIRE INIT 2.0 geth 1.10.8-fh", "FIRE INIT 2.0 geth 1.10.8-fh"]
    );
    assert!(!ctx.in_block());
}

#[test]
fn end_block_without_block_is_fatal() {
    init_logger();
    let mut ctx = Context::buffered(64);

    let err = ctx.end_block(&block(1), U256::zero()).unwrap_err();
    assert_eq!(err, TraceError::NoOpenBlock);
    assert!(err.is_fatal());
    assert!(ctx.firehose_log().unwrap().is_empty());
}

#[test]
fn cancel_block_without_block() {
    let mut ctx = Context::buffered(64);

    ctx.cancel_block(&block(3), &"invalid merkle root").unwrap();

    assert_eq!(buffered_lines(&ctx), ["FIRE CANCEL_BLOCK 3 invalid merkle root"]);
    assert!(!ctx.in_block());
    assert!(!ctx.in_transaction());
    assert!(!ctx.seen_block());
}

#[test]
fn finalize_block_outside_block() {
    let mut ctx = Context::buffered(64);
    ctx.finalize_block(&block(9)).unwrap();
    assert_eq!(buffered_lines(&ctx), ["FIRE FINALIZE_BLOCK 9"]);
}

#[test]
fn ordinals_increase_by_one_and_reset_per_block() {
    let mut ctx = Context::buffered(4096);

    for number in 1..=2 {
        ctx.start_block(&block(number)).unwrap();
        ctx.start_transaction_raw(RawTransaction::default()).unwrap();
        ctx.start_call(CallType::Create).unwrap();
        ctx.record_new_account(Address::repeat_byte(0x0c)).unwrap();
        ctx.record_nonce_change(Address::repeat_byte(0x0c), 0, 1).unwrap();
        ctx.record_gas_consume(100, 10, GasChangeReason::CodeStorage)
            .unwrap();
        ctx.end_call(90, &[]).unwrap();
        ctx.end_transaction(&Receipt::default()).unwrap();
        ctx.end_block(&block(number), U256::zero()).unwrap();
    }

    let lines = buffered_lines(&ctx);
    let ordinals = lines
        .iter()
        .filter(|line| !line.contains("_BLOCK "))
        .map(|line| match line.strip_prefix("FIRE END_APPLY_TRX ") {
            Some(fields) => fields.split(' ').nth(4).unwrap().parse().unwrap(),
            None => last_field(line),
        })
        .collect::<Vec<u64>>();
    assert_eq!(ordinals, [1, 2, 3, 4, 5, 6, 7, 1, 2, 3, 4, 5, 6, 7]);
}

#[rstest]
#[case(0, GasChangeReason::IntrinsicGas, None)]
#[case(10, GasChangeReason::Ignored, None)]
#[case(0, GasChangeReason::Ignored, None)]
#[case(10, GasChangeReason::IntrinsicGas, Some("FIRE GAS_CHANGE 0 100 90 intrinsic_gas 2"))]
#[case(100, GasChangeReason::TxRefunds, Some("FIRE GAS_CHANGE 0 100 0 tx_refunds 2"))]
fn gas_consume_suppression(
    #[case] consumed: u64,
    #[case] reason: GasChangeReason,
    #[case] expected: Option<&str>,
) {
    let mut ctx = in_transaction();
    ctx.record_gas_consume(100, consumed, reason).unwrap();

    let lines = buffered_lines(&ctx);
    assert_eq!(lines.get(2).map(String::as_str), expected);
    assert!(lines.len() <= 3);
}

#[test]
fn gas_refund_suppression() {
    let mut ctx = in_transaction();
    ctx.record_gas_refund(100, 0).unwrap();
    ctx.record_gas_refund(100, 20).unwrap();

    let lines = buffered_lines(&ctx);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "FIRE GAS_CHANGE 0 100 120 refund_after_execution 2");
}

#[test]
fn suppressed_events_do_not_require_a_transaction() {
    let mut ctx = Context::buffered(64);
    ctx.record_gas_consume(100, 0, GasChangeReason::Call).unwrap();
    ctx.record_gas_refund(100, 0).unwrap();
    ctx.record_balance_change(
        Address::zero(),
        U256::zero(),
        U256::one(),
        BalanceChangeReason::Ignored,
    )
    .unwrap();
    assert!(ctx.firehose_log().unwrap().is_empty());

    assert_eq!(
        ctx.record_gas_consume(100, 1, GasChangeReason::Call),
        Err(TraceError::NoOpenTransaction("record_gas_consume"))
    );
}

#[rstest]
#[case(U256::zero(), 1)]
#[case(U256::from(1_000_000u64), 2)]
fn suicide_withdraws_remaining_balance(#[case] balance: U256, #[case] expected_lines: usize) {
    let mut ctx = in_transaction();
    let contract = Address::repeat_byte(0xdd);
    ctx.record_suicide(contract, true, balance).unwrap();

    let lines = buffered_lines(&ctx);
    let recorded = &lines[2..];
    assert_eq!(recorded.len(), expected_lines);
    assert!(recorded[0].starts_with(&format!("FIRE SUICIDE_CHANGE 0 {} 1 ", "dd".repeat(20))));
    if expected_lines == 2 {
        assert_eq!(
            recorded[1],
            format!(
                "FIRE BALANCE_CHANGE 0 {} 0f4240 . suicide_withdraw 2",
                "dd".repeat(20)
            )
        );
    }
}

#[test]
fn in_call_events() {
    let mut ctx = in_transaction();
    let caller = Address::repeat_byte(0x01);
    let callee = Address::repeat_byte(0x02);

    ctx.start_call(CallType::Call).unwrap();
    ctx.record_call_params(CallType::Call, caller, callee, U256::zero(), 50_000, &[0xa9, 0x05])
        .unwrap();
    ctx.record_call_without_code().unwrap();
    ctx.record_keccak(H256::repeat_byte(0x0f), &[0x01]).unwrap();
    ctx.record_balance_change(callee, U256::zero(), U256::from(16), BalanceChangeReason::Transfer)
        .unwrap();
    ctx.record_log(&Log {
        address: callee,
        topics: vec![H256::repeat_byte(0x0a), H256::repeat_byte(0x0b)],
        data: vec![],
    })
    .unwrap();

    let lines = buffered_lines(&ctx);
    assert_eq!(
        &lines[3..],
        [
            format!(
                "FIRE EVM_PARAM CALL 1 {} {} . 50000 a905",
                "01".repeat(20),
                "02".repeat(20)
            ),
            "FIRE ACCOUNT_WITHOUT_CODE 1".to_owned(),
            format!("FIRE EVM_KECCAK 1 {} 01", "0f".repeat(32)),
            format!(
                "FIRE BALANCE_CHANGE 1 {} . 10 transfer 3",
                "02".repeat(20)
            ),
            format!(
                "FIRE ADD_LOG 1 0 {} {},{} . 4",
                "02".repeat(20),
                "0a".repeat(32),
                "0b".repeat(32)
            ),
        ]
    );
}

#[test]
fn transaction_without_block() {
    let mut ctx = Context::buffered(256);
    ctx.start_transaction_raw(RawTransaction::default()).unwrap();
    assert!(ctx.in_transaction());
    assert!(!ctx.in_block());

    ctx.end_transaction(&Receipt::default()).unwrap();
    assert!(!ctx.in_transaction());
    assert_eq!(ctx.call_depth(), 0);
}

#[test]
fn end_block_closes_open_transaction() {
    let mut ctx = in_transaction();
    ctx.start_call(CallType::Call).unwrap();
    ctx.end_block(&block(1), U256::zero()).unwrap();

    assert!(!ctx.in_block());
    assert!(!ctx.in_transaction());
    assert_eq!(ctx.call_depth(), 0);
    assert_eq!(ctx.ordinal(), 0);
}

#[test]
fn reset_restores_initial_state() {
    let mut ctx = in_transaction();
    ctx.start_call(CallType::Call).unwrap();
    ctx.reset();

    assert!(!ctx.in_block());
    assert!(!ctx.in_transaction());
    assert_eq!(ctx.call_depth(), 0);
    assert_eq!(ctx.ordinal(), 0);
    assert_eq!(ctx.active_call_index(), 0);
    assert_eq!(ctx.last_transaction_index(), None);

    ctx.start_block(&block(2)).unwrap();
}

#[test]
fn noop_context_accepts_everything() {
    let mut ctx = Context::noop();
    let address = Address::repeat_byte(0x01);

    ctx.init_version("node", PROTOCOL_VERSION, "variant").unwrap();
    ctx.end_block(&block(1), U256::zero()).unwrap();
    ctx.cancel_block(&block(1), &"whatever").unwrap();
    ctx.finalize_block(&block(1)).unwrap();
    ctx.start_block(&block(1)).unwrap();
    ctx.start_block(&block(1)).unwrap();
    ctx.record_genesis_block(&block(0), |_| Ok(())).unwrap();
    ctx.record_trx_from(address).unwrap();
    ctx.end_transaction(&Receipt::default()).unwrap();
    ctx.start_call(CallType::Call).unwrap();
    ctx.end_call(0, &[]).unwrap();
    ctx.end_call(0, &[]).unwrap();
    ctx.end_failed_call(0, false, "").unwrap();
    ctx.record_call_params(CallType::Call, address, address, U256::one(), 0, &[]).unwrap();
    ctx.record_call_without_code().unwrap();
    ctx.record_call_failed(0, "").unwrap();
    ctx.record_call_reverted().unwrap();
    ctx.record_keccak(H256::zero(), &[]).unwrap();
    ctx.record_gas_refund(0, 1).unwrap();
    ctx.record_gas_consume(1, 1, GasChangeReason::Call).unwrap();
    ctx.record_storage_change(address, H256::zero(), H256::zero(), H256::zero()).unwrap();
    ctx.record_balance_change(address, U256::zero(), U256::one(), BalanceChangeReason::Transfer)
        .unwrap();
    ctx.record_log(&Log::default()).unwrap();
    ctx.record_suicide(address, true, U256::one()).unwrap();
    ctx.record_new_account(address).unwrap();
    ctx.record_code_change(address, None, &[], H256::zero(), &[]).unwrap();
    ctx.record_nonce_change(address, 0, 1).unwrap();
    ctx.record_trx_pool("TRX_ENTER_POOL", &Default::default()).unwrap();

    let mut other = Context::buffered(16);
    ctx.flush_transaction(&mut other);
    ctx.reset();

    assert!(ctx.firehose_log().is_none());
    assert!(!ctx.in_block());
    assert!(!ctx.seen_block());
}
