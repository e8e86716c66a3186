use std::net::SocketAddr;
use std::sync::Arc;

use echo_http::server::Server;
use echo_server::EchoHandler;
use tokio::process::Command;

async fn start_server() -> SocketAddr {
    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.serve(Arc::new(EchoHandler)));
    addr
}

#[tokio::test]
async fn client_prints_both_replies() {
    let addr = start_server().await;

    let output = Command::new(env!("CARGO_BIN_EXE_echo-client"))
        .arg(format!("http://{addr}/"))
        .arg("hello echo")
        .output()
        .await
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        concat!(
            "Sending message: \"hello echo\"...\n",
            "Got reply: \"hello echo\"!\n",
            "Sending message (again): \"hello echo\"...\n",
            "Got reply: \"hello echo\"!\n",
        )
    );
}

#[tokio::test]
async fn debug_dumps_the_traffic_on_stderr() {
    let addr = start_server().await;

    let output = Command::new(env!("CARGO_BIN_EXE_echo-client"))
        .arg(addr.to_string())
        .arg("ping")
        .arg("--debug")
        .output()
        .await
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("=> Send data, 0000000004 bytes (0x00000004)").count(), 2);
    assert_eq!(stderr.matches("<= Recv header").count(), 2);
    assert!(stderr.contains("70 69 6e 67"), "{stderr}");
}

#[tokio::test]
async fn unreachable_server_fails() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let output = Command::new(env!("CARGO_BIN_EXE_echo-client")).arg(addr.to_string()).arg("ping").output().await.unwrap();

    assert!(!output.status.success());
}
