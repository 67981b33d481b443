use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::{Revert, SolCall, SolError};
use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use lottery_adapters::config::{
    ENV_CONTRACT_ADDRESS, ENV_PROXY_URL, ENV_RECEIPT_POLL_MS, ENV_RPC_TIMEOUT_MS,
    ENV_RUNTIME_PROFILE,
};
use lottery_adapters::{Eip1193Adapter, LotteryAdapterConfig, RuntimeProfile, DEFAULT_ACCOUNT};
use lottery_core::{
    decode_revert_reason, ILottery, PortError, ProviderPort, TxRequest, DEFAULT_CONTRACT_ADDRESS,
    REQUIRED_CHAIN_ID, TICKET_PRICE_WEI,
};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn config_defaults_without_environment() {
    let cfg = LotteryAdapterConfig::from_lookup(lookup(&[]));
    assert_eq!(cfg.runtime_profile, RuntimeProfile::Development);
    assert_eq!(cfg.eip1193_proxy_url, None);
    assert_eq!(cfg.contract_address, DEFAULT_CONTRACT_ADDRESS);
    assert_eq!(cfg.rpc_timeout_ms, 15_000);
    assert_eq!(cfg.receipt_poll_interval_ms, 4_000);

    let controller = cfg.controller_config();
    assert_eq!(controller.required_chain_id, REQUIRED_CHAIN_ID);
    assert_eq!(controller.receipt_poll_interval, Duration::from_millis(4_000));
}

#[test]
fn config_reads_overrides_and_ignores_garbage() {
    let cfg = LotteryAdapterConfig::from_lookup(lookup(&[
        (ENV_PROXY_URL, " http://127.0.0.1:8545 "),
        (ENV_RUNTIME_PROFILE, "Production"),
        (ENV_CONTRACT_ADDRESS, "0x000000000000000000000000000000000000CAFE"),
        (ENV_RPC_TIMEOUT_MS, "0"),
        (ENV_RECEIPT_POLL_MS, "250"),
    ]));
    assert_eq!(cfg.eip1193_proxy_url.as_deref(), Some("http://127.0.0.1:8545"));
    assert!(cfg.strict_runtime_required());
    let cafe: Address = "0x000000000000000000000000000000000000CAFE"
        .parse()
        .expect("address");
    assert_eq!(cfg.contract_address, cafe);
    assert_eq!(cfg.rpc_timeout_ms, 15_000);
    assert_eq!(cfg.controller_config().receipt_poll_interval, Duration::from_millis(250));

    let cfg = LotteryAdapterConfig::from_lookup(lookup(&[
        (ENV_CONTRACT_ADDRESS, "not-an-address"),
        (ENV_RUNTIME_PROFILE, "staging"),
    ]));
    assert_eq!(cfg.contract_address, DEFAULT_CONTRACT_ADDRESS);
    assert_eq!(cfg.runtime_profile, RuntimeProfile::Development);
}

#[test]
fn production_profile_without_proxy_disables_wallet() {
    let cfg = LotteryAdapterConfig {
        runtime_profile: RuntimeProfile::Production,
        eip1193_proxy_url: None,
        ..LotteryAdapterConfig::default()
    };
    let adapter = Eip1193Adapter::with_config(cfg);
    assert_eq!(adapter.mode_name(), "disabled");
    assert!(!adapter.available());
    let err = adapter
        .request_accounts()
        .expect_err("runtime should be required");
    assert!(matches!(err, PortError::Unavailable(_)));
}

#[test]
fn deterministic_wallet_answers_like_a_provider() {
    let adapter = Eip1193Adapter::deterministic(LotteryAdapterConfig::default());
    assert!(adapter.available());
    assert_eq!(
        adapter.request_accounts().expect("accounts"),
        vec![DEFAULT_ACCOUNT]
    );
    assert_eq!(adapter.chain_id().expect("chain"), REQUIRED_CHAIN_ID);

    adapter.debug_set_chain_id(1).expect("chain");
    adapter.switch_chain(REQUIRED_CHAIN_ID).expect("switch");
    assert_eq!(adapter.chain_id().expect("chain"), REQUIRED_CHAIN_ID);

    let mut wrong_price = TxRequest::read(
        DEFAULT_CONTRACT_ADDRESS,
        ILottery::buyTicketCall {}.abi_encode().into(),
    );
    wrong_price.from = DEFAULT_ACCOUNT;
    wrong_price.value = U256::from(1u64);
    match adapter.call(&wrong_price, None) {
        Err(PortError::Revert { data, .. }) => assert_eq!(
            decode_revert_reason(&data).as_deref(),
            Some("Must send exactly 0.01 ETH")
        ),
        other => panic!("expected revert, got {other:?}"),
    }

    wrong_price.value = TICKET_PRICE_WEI;
    adapter.call(&wrong_price, None).expect("dry run succeeds");
    assert!(adapter.debug_players().expect("players").is_empty());
}

type Calls = Arc<Mutex<Vec<(String, Value)>>>;

fn spawn_mock_wallet(calls: Calls) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());

    let owner_revert = alloy::hex::encode_prefixed(
        Revert {
            reason: "Only owner can pick winner".to_owned(),
        }
        .abi_encode(),
    );

    let join = thread::spawn(move || {
        for _ in 0..10 {
            let mut req = match server.recv_timeout(Duration::from_secs(5)) {
                Ok(Some(r)) => r,
                _ => break,
            };
            let mut body = String::new();
            if req.as_reader().read_to_string(&mut body).is_err() {
                break;
            }
            let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = payload["method"].as_str().unwrap_or_default().to_owned();
            let params = payload["params"].clone();
            if let Ok(mut g) = calls.lock() {
                g.push((method.clone(), params.clone()));
            }

            let outcome: Result<Value, Value> = match method.as_str() {
                "eth_requestAccounts" => Ok(json!(["0xabc0000000000000000000000000000000000001"])),
                "eth_chainId" => Ok(json!("0xaa36a7")),
                "wallet_switchEthereumChain" => Err(json!({
                    "code": 4902,
                    "message": "Unrecognized chain ID \"0xaa36a7\"."
                })),
                "eth_getBlockByNumber" => Ok(json!({"number": "0x10", "baseFeePerGas": "0x3b9aca00"})),
                "eth_maxPriorityFeePerGas" => Err(json!({
                    "code": -32601,
                    "message": "the method eth_maxPriorityFeePerGas does not exist"
                })),
                "eth_sendTransaction" => Err(json!({
                    "code": 4001,
                    "message": "MetaMask Tx Signature: User denied transaction signature."
                })),
                "eth_call" => Err(json!({
                    "code": 3,
                    "message": "execution reverted: Only owner can pick winner",
                    "data": owner_revert.as_str()
                })),
                "eth_getTransactionReceipt" => {
                    if params[0].as_str().is_some_and(|h| h.starts_with("0x11")) {
                        Ok(Value::Null)
                    } else if params[0].as_str().is_some_and(|h| h.starts_with("0x33")) {
                        Ok(json!({
                            "status": "0x1",
                            "blockNumber": "0x10000000000000000",
                            "gasUsed": "0xc350"
                        }))
                    } else {
                        Ok(json!({
                            "status": "0x1",
                            "blockNumber": "0x10",
                            "gasUsed": "0xc350"
                        }))
                    }
                }
                _ => Err(json!({"code": -32601, "message": "method not found"})),
            };
            let body = match outcome {
                Ok(result) => json!({"jsonrpc": "2.0", "id": payload["id"], "result": result}),
                Err(error) => json!({"jsonrpc": "2.0", "id": payload["id"], "error": error}),
            };
            let response = Response::from_string(body.to_string()).with_status_code(StatusCode(200));
            let _ = req.respond(response);
        }
    });

    (addr, join)
}

#[test]
fn proxy_mode_relays_json_rpc_and_maps_wallet_errors() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let (addr, join) = spawn_mock_wallet(Arc::clone(&calls));
    let adapter = Eip1193Adapter::with_config(LotteryAdapterConfig {
        eip1193_proxy_url: Some(addr),
        ..LotteryAdapterConfig::default()
    });
    assert_eq!(adapter.mode_name(), "proxy");

    let player: Address = "0xABC0000000000000000000000000000000000001"
        .parse()
        .expect("player");
    assert_eq!(adapter.request_accounts().expect("accounts"), vec![player]);
    assert_eq!(adapter.chain_id().expect("chain"), REQUIRED_CHAIN_ID);

    let fee = adapter.fee_data().expect("fee data");
    assert_eq!(fee.max_priority_fee_per_gas, 1_000_000_000);
    assert_eq!(fee.max_fee_per_gas, 3_000_000_000);

    let err = adapter
        .switch_chain(REQUIRED_CHAIN_ID)
        .expect_err("unknown chain");
    assert!(matches!(err, PortError::UnrecognizedChain(_)));

    let request = TxRequest {
        from: player,
        to: DEFAULT_CONTRACT_ADDRESS,
        value: TICKET_PRICE_WEI,
        data: ILottery::buyTicketCall {}.abi_encode().into(),
        gas_limit: Some(300_000),
        max_fee_per_gas: Some(fee.max_fee_per_gas),
        max_priority_fee_per_gas: Some(fee.max_priority_fee_per_gas),
    };
    let err = adapter.send_transaction(&request).expect_err("user denied");
    assert!(matches!(err, PortError::UserRejected(_)));

    match adapter.call(&request, Some(16)) {
        Err(PortError::Revert { data, .. }) => assert_eq!(
            decode_revert_reason(&data).as_deref(),
            Some("Only owner can pick winner")
        ),
        other => panic!("expected revert, got {other:?}"),
    }

    let pending = B256::repeat_byte(0x11);
    assert_eq!(adapter.transaction_receipt(pending).expect("pending"), None);
    let mined = B256::repeat_byte(0x22);
    let receipt = adapter
        .transaction_receipt(mined)
        .expect("receipt")
        .expect("mined");
    assert!(receipt.success);
    assert_eq!(receipt.block_number, 16);
    assert_eq!(receipt.gas_used, 50_000);
    assert_eq!(receipt.tx_hash, mined);

    let err = adapter
        .transaction_receipt(B256::repeat_byte(0x33))
        .expect_err("block number above u64");
    assert!(matches!(err, PortError::Validation(ref m) if m.contains("blockNumber out of range")));

    drop(adapter);
    join.join().expect("join server");

    let calls = calls.lock().expect("calls").clone();
    let methods: Vec<&str> = calls.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(
        methods,
        vec![
            "eth_requestAccounts",
            "eth_chainId",
            "eth_getBlockByNumber",
            "eth_maxPriorityFeePerGas",
            "wallet_switchEthereumChain",
            "eth_sendTransaction",
            "eth_call",
            "eth_getTransactionReceipt",
            "eth_getTransactionReceipt",
            "eth_getTransactionReceipt",
        ]
    );

    let switch_params = &calls[4].1;
    assert_eq!(switch_params[0]["chainId"], "0xaa36a7");

    let tx = &calls[5].1[0];
    assert_eq!(tx["value"], "0x2386f26fc10000");
    assert_eq!(tx["gas"], "0x493e0");
    assert_eq!(tx["maxFeePerGas"], "0xb2d05e00");
    assert_eq!(
        tx["data"],
        alloy::hex::encode_prefixed(ILottery::buyTicketCall::SELECTOR)
    );

    assert_eq!(calls[6].1[1], "0x10");
}
