use tezos_rpc::Service;
use tezos_rpc::http::{DecodeError, RpcClient, RpcError, StreamEnd};
use tezos_rpc::models::{BalanceUpdate, ErrorKind, OperationElem, TestChainStatus};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JSON: &str = "application/json";

fn json(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_owned(), JSON)
}

async fn serve(route: &str, response: ResponseTemplate) -> (MockServer, Service) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("content-type", JSON))
        .and(header("accept", JSON))
        .respond_with(response)
        .expect(1)
        .mount(&server)
        .await;

    let client = RpcClient::new(Url::parse(&server.uri()).unwrap()).unwrap();
    (server, Service::new(client))
}

#[tokio::test]
async fn test_network_stats() {
    let (_server, service) = serve("/network/stat", json(include_str!("fixtures/network/stat.json"))).await;

    let stats = service.get_network_stats().await.unwrap();

    assert_eq!(stats.total_bytes_sent, 291_690_080);
    assert_eq!(stats.total_bytes_recv, 532_639_553);
    assert_eq!(stats.current_inflow, 23_596);
    assert_eq!(stats.current_outflow, 14_972);
}

#[tokio::test]
async fn test_network_connections() {
    let (_server, service) = serve(
        "/network/connections",
        json(include_str!("fixtures/network/connections.json")),
    )
    .await;

    let connections = service.get_network_connections().await.unwrap();

    assert_eq!(connections.len(), 2);
    assert_eq!(connections[0].peer_id, "idt5qvkLiJ15rb6yJU1bjpGmdyYnPJ");
    assert_eq!(connections[0].id_point.port, 9732);
    assert!(connections[1].incoming);
    assert_eq!(connections[1].id_point.port, 0);
    assert!(connections[1].remote_metadata.disable_mempool);
}

#[tokio::test]
async fn test_network_peers_without_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/network/peers"))
        .and(query_param_is_missing("filter"))
        .respond_with(json(include_str!("fixtures/network/peers.json")))
        .expect(1)
        .mount(&server)
        .await;
    let service = Service::new(RpcClient::new(Url::parse(&server.uri()).unwrap()).unwrap());

    let peers = service.get_network_peers(None).await.unwrap();

    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0].peer_id, "idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X");
    assert_eq!(peers[0].state, "running");
    assert!(peers[0].last_established_connection.is_some());
    assert_eq!(peers[1].peer_id, "idsXeq1SwgDgVGKhkNUFuBuq37pHmv");
    assert_eq!(peers[1].score, -0.5);
    assert!(peers[1].trusted);
    assert!(peers[1].reachable_at.is_none());
}

#[tokio::test]
async fn test_network_peers_with_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/network/peers"))
        .and(query_param("filter", "running"))
        .respond_with(json("[]"))
        .expect(1)
        .mount(&server)
        .await;
    let service = Service::new(RpcClient::new(Url::parse(&server.uri()).unwrap()).unwrap());

    let peers = service.get_network_peers(Some("running")).await.unwrap();
    assert!(peers.is_empty());
}

#[tokio::test]
async fn test_network_peer_carries_its_id() {
    let peer = r#"{
        "score": 0, "trusted": false, "state": "running",
        "stat": {"total_sent": "1", "total_recv": "2", "current_inflow": 0, "current_outflow": 0}
    }"#;
    let (_server, service) = serve("/network/peers/idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X", json(peer)).await;

    let peer = service.get_network_peer("idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X").await.unwrap();

    assert_eq!(peer.peer_id, "idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X");
    assert_eq!(peer.stat.total_bytes_recv, 2);
}

#[tokio::test]
async fn test_ban_and_trust_peer() {
    let (_ban_server, service) = serve("/network/peers/idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X/ban", json("{}")).await;
    service.ban_network_peer("idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X").await.unwrap();

    let (_trust_server, service) = serve("/network/peers/idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X/trust", json("null")).await;
    service.trust_network_peer("idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X").await.unwrap();
}

#[tokio::test]
async fn test_network_peer_banned() {
    let (_server, service) = serve("/network/peers/idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X/banned", json("true")).await;
    assert!(service.get_network_peer_banned("idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X").await.unwrap());
}

#[tokio::test]
async fn test_network_peer_log() {
    let (_server, service) = serve(
        "/network/peers/idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X/log",
        json(include_str!("fixtures/network/peer_log.json")),
    )
    .await;

    let log = service.get_network_peer_log("idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X").await.unwrap();

    assert_eq!(log.len(), 2);
    assert_eq!(log[0].kind, "incoming_request");
    assert_eq!(log[1].kind, "connection_established");
    assert_eq!(log[1].address.port, 9732);
}

#[tokio::test]
async fn test_monitor_network_peer_log_batches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/network/peers/idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X/log"))
        .and(query_param("monitor", ""))
        .respond_with(json(concat!(
            r#"[{"kind": "incoming_request", "timestamp": "2018-11-13T15:47:13Z", "addr": "::ffff:51.15.242.114", "port": 9732}]"#,
            "\n",
            r#"[]"#,
            "\n",
        )))
        .expect(1)
        .mount(&server)
        .await;
    let service = Service::new(RpcClient::new(Url::parse(&server.uri()).unwrap()).unwrap());

    let mut batches = service
        .monitor_network_peer_log("idrnHcGMrFxiYsmxf5Cqd6NhUTUU8X", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(batches.next().await.unwrap().unwrap().len(), 1);
    assert!(batches.next().await.unwrap().unwrap().is_empty());
    assert!(batches.next().await.is_none());
    assert_eq!(batches.outcome(), Some(StreamEnd::Completed));
}

#[tokio::test]
async fn test_balances() {
    let (_delegate_server, service) = serve(
        "/chains/main/blocks/head/context/delegates/tz1KfEsrtDaA1sX7vdM4qmEPWuSytuqCDp5j/balance",
        json(r#""13490453135591""#),
    )
    .await;
    let balance = service
        .get_delegate_balance("main", "head", "tz1KfEsrtDaA1sX7vdM4qmEPWuSytuqCDp5j")
        .await
        .unwrap();
    assert_eq!(balance, 13_490_453_135_591);

    let (_contract_server, service) = serve(
        "/chains/main/blocks/head/context/contracts/KT1BvVxWM6cjFuJNet4R9m64VDCN2iMvjuGE/balance",
        json(r#""0""#),
    )
    .await;
    let balance = service
        .get_contract_balance("main", "head", "KT1BvVxWM6cjFuJNet4R9m64VDCN2iMvjuGE")
        .await
        .unwrap();
    assert_eq!(balance, 0);
}

#[tokio::test]
async fn test_block() {
    let (_server, service) = serve("/chains/main/blocks/head", json(include_str!("fixtures/block/head.json"))).await;

    let block = service.get_block("main", "head").await.unwrap();

    assert_eq!(block.header.level, 174_950);
    assert_eq!(block.metadata.test_chain_status, TestChainStatus::NotRunning);
    assert_eq!(block.operations.len(), 4);

    let OperationElem::Transaction(transfer) = &block.operations[3][0].contents[0] else {
        panic!("expected a transaction");
    };
    assert_eq!(transfer.fee, 1_420);
    assert_eq!(transfer.amount, 1_000_000);
    let updates = &transfer.metadata.as_ref().unwrap().balance_updates;
    assert!(matches!(&updates[0], BalanceUpdate::Contract(c) if c.change == -1_420));
}

#[tokio::test]
async fn test_mempool_pending_operations() {
    let (_server, service) = serve(
        "/chains/main/mempool/pending_operations",
        json(include_str!("fixtures/mempool/pending_operations.json")),
    )
    .await;

    let pending = service.get_mempool_pending_operations("main").await.unwrap();

    assert_eq!(pending.applied.len(), 1);
    assert!(matches!(pending.applied[0].contents[0], OperationElem::Endorsement(_)));

    let refused = &pending.refused[0].0;
    assert_eq!(refused.operation.hash, "onvPC2C7bCRZb6xRVjd3zE6ZEcdrNVmHj6K2tqYshiHrGwp9DLk");
    assert!(matches!(&refused.operation.contents[0], OperationElem::Generic(g) if g.kind == "reveal"));
    assert_eq!(refused.error[0].kind, ErrorKind::Temporary);
    assert_eq!(refused.error[0].id, "proto.003-PsddFKi3.contract.counter_in_the_past");

    assert!(pending.branch_refused.is_empty());
    assert_eq!(
        pending.unprocessed[0].0.hash,
        "ooLPLLmZkL1FeVs2z5gjYYUeUppUeanHUdUGu4yUsjqhvgQ1sUm"
    );
}

#[tokio::test]
async fn test_protocol_error_response() {
    let (_server, service) = serve(
        "/network/stat",
        ResponseTemplate::new(500).set_body_raw(include_str!("fixtures/errors/protocol_error.json"), JSON),
    )
    .await;

    let err = service.get_network_stats().await.unwrap_err();

    match &err {
        RpcError::Protocol { status, errors, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, include_str!("fixtures/errors/protocol_error.json"));
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].kind, ErrorKind::Permanent);
            assert_eq!(errors[0].id, "proto.003-PsddFKi3.context.storage_error");
            assert_eq!(errors[0].details["function"], "get");
        },
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        r#"RPC error (kind = "permanent", id = "proto.003-PsddFKi3.context.storage_error")"#
    );
}

#[tokio::test]
async fn test_empty_protocol_error_response() {
    let (_server, service) = serve(
        "/network/stat",
        ResponseTemplate::new(500).set_body_raw(include_str!("fixtures/errors/empty_error.json"), JSON),
    )
    .await;

    let err = service.get_network_stats().await.unwrap_err();
    assert!(matches!(err, RpcError::EmptyProtocolError { status, .. } if status.as_u16() == 500));
}

#[tokio::test]
async fn test_malformed_protocol_error_response() {
    let (_server, service) = serve(
        "/network/stat",
        ResponseTemplate::new(500).set_body_raw(include_str!("fixtures/errors/malformed_error.json"), JSON),
    )
    .await;

    let err = service.get_network_stats().await.unwrap_err();
    assert!(matches!(err, RpcError::Decode(DecodeError::ProtocolErrorBody(_))));
    assert!(err.to_string().starts_with("error decoding RPC error: "));
}

#[tokio::test]
async fn test_not_found_response() {
    let (_server, service) = serve(
        "/chains/main/blocks/BLunknown",
        ResponseTemplate::new(404).set_body_raw("No service found at this URL\n", "text/plain"),
    )
    .await;

    let err = service.get_block("main", "BLunknown").await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert_eq!(err.body_text().as_deref(), Some("No service found at this URL\n"));
    assert_eq!(err.to_string(), "HTTP status 404 Not Found");
}

#[tokio::test]
async fn test_not_found_response_with_binary_body() {
    let raw = b"bad \xff\xfe body".to_vec();
    let (_server, service) = serve(
        "/chains/main/blocks/BLunknown",
        ResponseTemplate::new(404).set_body_raw(raw.clone(), "application/octet-stream"),
    )
    .await;

    let err = service.get_block("main", "BLunknown").await.unwrap_err();

    assert!(matches!(err, RpcError::HttpStatus { status, .. } if status.as_u16() == 404));
    assert_eq!(err.body(), Some(raw.as_slice()));
}

#[tokio::test]
async fn test_bootstrapped_stream() {
    let (_server, service) = serve(
        "/monitor/bootstrapped",
        json(concat!(
            r#"{"block": "BLgz6z8w5bYtn2AAEmsfMD3aH9o8SUnVygUpVUsCe6dkRpEt5Qy", "timestamp": "2018-11-13T19:26:28Z"}"#,
            "\n",
            r#"{"block": "BLc7tKfzia9hnaY1YTMS6RkDniQBoApM4EjKFRLucsuHbiy3eqt", "timestamp": "2018-11-13T19:26:58Z"}"#,
            "\n",
            r#"{"block": "BM3pW1S5fZwJw8KQg2YtSMxvqcZjjvDr1kTcqrsTVDAhqX8ZChU", "timestamp": "2018-11-13T19:27:28Z"}"#,
            "\n",
        )),
    )
    .await;

    let mut blocks = service.get_bootstrapped(CancellationToken::new()).await.unwrap();

    let mut received = Vec::new();
    while let Some(block) = blocks.next().await {
        received.push(block.unwrap().block);
    }
    assert_eq!(
        received,
        [
            "BLgz6z8w5bYtn2AAEmsfMD3aH9o8SUnVygUpVUsCe6dkRpEt5Qy",
            "BLc7tKfzia9hnaY1YTMS6RkDniQBoApM4EjKFRLucsuHbiy3eqt",
            "BM3pW1S5fZwJw8KQg2YtSMxvqcZjjvDr1kTcqrsTVDAhqX8ZChU",
        ]
    );
    assert_eq!(blocks.outcome(), Some(StreamEnd::Completed));
}

#[tokio::test]
async fn test_bootstrapped_stream_forwarded_and_cancelled() {
    let (_server, service) = serve(
        "/monitor/bootstrapped",
        json(r#"{"block": "BLgz6z8w5bYtn2AAEmsfMD3aH9o8SUnVygUpVUsCe6dkRpEt5Qy", "timestamp": "2018-11-13T19:26:28Z"}"#),
    )
    .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let blocks = service.get_bootstrapped(cancel).await.unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::channel(4);
    assert_eq!(blocks.forward(&tx).await.unwrap(), StreamEnd::Cancelled);
    drop(tx);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_unreachable_node_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = Service::new(RpcClient::new(Url::parse(&format!("http://{addr}")).unwrap()).unwrap());
    let err = service.get_network_stats().await.unwrap_err();

    assert!(matches!(err, RpcError::Transport(_)), "{err:?}");
    assert!(err.status().is_none());
}
