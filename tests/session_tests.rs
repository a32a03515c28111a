//! End-to-end tests driving TelnetSession against scripted TCP servers.

use telscript::config::SessionConfig;
use telscript::errors::TelnetError;
use telscript::script::Script;
use telscript::session::TelnetSession;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

/// Run a one-connection scripted server on an ephemeral port.
fn spawn_server<T, F>(serve: F) -> (SocketAddr, thread::JoinHandle<T>)
where
    F: FnOnce(TcpStream) -> T + Send + 'static,
    T: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        serve(stream)
    });
    (addr, handle)
}

fn session_for(addr: SocketAddr) -> TelnetSession {
    let mut config = SessionConfig::default();
    config.connection.host = addr.ip().to_string();
    config.connection.port = addr.port();
    config.connection.timeout = Duration::from_secs(2);
    TelnetSession::new(config)
}

/// Read server-side up to (and discarding) the carriage return the client
/// appends to each command.
fn read_line(stream: &mut TcpStream) -> Vec<u8> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) => break,
            Ok(_) if byte[0] == b'\r' => break,
            Ok(_) => line.push(byte[0]),
            Err(e) => panic!("server read failed: {}", e),
        }
    }
    line
}

#[test]
fn execute_round_trip_over_tcp() {
    let (addr, server) = spawn_server(|mut stream| {
        let command = read_line(&mut stream);
        stream.write_all(b"hi\n$").unwrap();
        command
    });

    let mut session = session_for(addr);
    session.connect().unwrap();

    let output = session.execute("echo hi", None, None).unwrap();
    assert_eq!(output, "hi");

    session.disconnect().unwrap();
    assert_eq!(server.join().unwrap(), b"echo hi");
}

#[test]
fn negotiation_offer_gets_exact_refusal() {
    let (addr, server) = spawn_server(|mut stream| {
        // offer NAWS before any data
        stream.write_all(&[255, 253, 31]).unwrap();

        let mut reply = [0u8; 3];
        stream.read_exact(&mut reply).unwrap();

        stream.write_all(b"ready\n$").unwrap();
        reply
    });

    let mut session = session_for(addr);
    session.connect().unwrap();

    let output = session.read().unwrap();
    assert_eq!(output, b"ready\n");
    // IAC DO 31 was answered with IAC WONT 31
    assert_eq!(server.join().unwrap(), [255, 252, 31]);
}

#[test]
fn error_prompt_raises_remote_error() {
    let (addr, server) = spawn_server(|mut stream| {
        let _ = read_line(&mut stream);
        stream.write_all(b"% unknown command\nERROR").unwrap();
    });

    let mut session = session_for(addr);
    session.connect().unwrap();

    let result = session.execute("bogus", None, None);
    assert!(matches!(result, Err(TelnetError::Remote(_))));
    server.join().unwrap();
}

#[test]
fn silent_server_times_out_after_budget() {
    let (addr, server) = spawn_server(|stream| {
        thread::sleep(Duration::from_millis(900));
        drop(stream);
    });

    let mut session = session_for(addr);
    session.set_timeout(Duration::from_millis(300));
    session.connect().unwrap();

    let started = Instant::now();
    let result = session.read();
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(TelnetError::Timeout { .. })));
    assert!(elapsed >= Duration::from_millis(300));
    // bounded overshoot: well under the server's silence window
    assert!(elapsed < Duration::from_millis(900));
    server.join().unwrap();
}

#[test]
fn login_exchange() {
    let (addr, server) = spawn_server(|mut stream| {
        stream.write_all(b"Login:").unwrap();
        let username = read_line(&mut stream);
        stream.write_all(b"Password:").unwrap();
        let password = read_line(&mut stream);
        stream.write_all(b"OK").unwrap();
        (username, password)
    });

    let mut session = session_for(addr);
    session.connect().unwrap();

    session.login("admin", "secret").unwrap();

    let (username, password) = server.join().unwrap();
    assert_eq!(username, b"admin");
    assert_eq!(password, b"secret");
}

#[test]
fn login_wraps_timeout_when_marker_never_arrives() {
    let (addr, server) = spawn_server(|mut stream| {
        stream.write_all(b"Login:").unwrap();
        let _ = read_line(&mut stream);
        // never send "Password:"
        thread::sleep(Duration::from_millis(800));
    });

    let mut session = session_for(addr);
    session.set_timeout(Duration::from_millis(300));
    session.connect().unwrap();

    match session.login("admin", "secret") {
        Err(TelnetError::LoginFailed(cause)) => {
            assert!(matches!(*cause, TelnetError::Timeout { .. }));
        }
        other => panic!("expected LoginFailed, got {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn read_bytes_in_binary_mode_passes_iac_through() {
    let payload = [0u8, 255, 13, 255, 7];

    let (addr, server) = spawn_server(move |mut stream| {
        stream.write_all(&payload).unwrap();
        // confirm nothing came back: the client must not negotiate
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut scratch = [0u8; 8];
        matches!(stream.read(&mut scratch), Err(_) | Ok(0))
    });

    let mut session = session_for(addr);
    session.set_binary_mode(true);
    session.connect().unwrap();

    let bytes = session.read_bytes(5).unwrap();
    assert_eq!(bytes, payload);
    assert!(server.join().unwrap(), "client sent unexpected bytes");
}

#[test]
fn transcript_spans_the_whole_session() {
    let (addr, server) = spawn_server(|mut stream| {
        let _ = read_line(&mut stream);
        stream.write_all(b"one\n$").unwrap();
        let _ = read_line(&mut stream);
        stream.write_all(b"two\n$").unwrap();
    });

    let mut session = session_for(addr);
    session.connect().unwrap();

    session.execute("first", None, None).unwrap();
    session.execute("second", None, None).unwrap();

    assert_eq!(session.transcript(), b"first\rone\n$second\rtwo\n$");
    server.join().unwrap();
}

#[test]
fn session_reconnects_after_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        for greeting in [&b"first$"[..], &b"second$"[..]] {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(greeting).unwrap();
        }
    });

    let mut session = session_for(addr);

    session.connect().unwrap();
    assert_eq!(session.read().unwrap(), b"first");
    session.disconnect().unwrap();
    assert!(!session.is_connected());

    session.connect().unwrap();
    assert_eq!(session.read().unwrap(), b"second");
    session.disconnect().unwrap();

    server.join().unwrap();
}

#[test]
fn script_runs_end_to_end() {
    let (addr, server) = spawn_server(|mut stream| {
        stream.write_all(b"Login:").unwrap();
        let _ = read_line(&mut stream);
        stream.write_all(b"Password:").unwrap();
        let _ = read_line(&mut stream);
        stream.write_all(b"OK").unwrap();

        let command = read_line(&mut stream);
        stream.write_all(b"eth0 up\n$").unwrap();
        command
    });

    let script_json = r#"
{
  "name": "link check",
  "steps": [
    { "action": "login", "username": "admin", "password": "secret" },
    { "action": "command", "command": "show link" }
  ]
}
"#;
    let mut script_file = tempfile::NamedTempFile::new().unwrap();
    script_file.write_all(script_json.as_bytes()).unwrap();
    let script = Script::load_from_file(script_file.path().to_str().unwrap()).unwrap();

    let mut session = session_for(addr);
    session.connect().unwrap();

    let reports = script.run(&mut session).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].label, "show link");
    assert_eq!(reports[1].output, "eth0 up");

    assert_eq!(server.join().unwrap(), b"show link");
}
