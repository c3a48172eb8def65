//! Drive RobotClient against a fake controller on a loopback socket

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use rmslib::{BufferTarget, ClientConfig, Pose, RmsError, Robot, RobotClient, IDENTITY_QUATERNION};

/// Read one request, up to and including the trailing '#'
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut request = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {
                request.push(byte[0]);
                if byte[0] == b'#' {
                    return Some(String::from_utf8_lossy(&request).into_owned());
                }
            }
        }
    }
}

/// Minimal motion server: tracks the buffer length and a fixed position.
/// Returns every request it saw once the client disconnects.
fn spawn_controller(listener: TcpListener) -> JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut seen = Vec::new();
        let mut buffered = 0usize;
        while let Some(request) = read_request(&mut stream) {
            seen.push(request.clone());
            let id = request.split_whitespace().next().unwrap().to_string();
            let reply = match id.as_str() {
                "99" => break,
                "03" => format!("{} 1 100.0 200.0 300.0 1 0 0 0 #", id),
                "30" => {
                    buffered += 1;
                    format!("{} 1 #", id)
                }
                "31" => {
                    buffered = 0;
                    format!("{} 1 #", id)
                }
                "32" => format!("{} 1 {} #", id, buffered),
                _ => format!("{} 1 #", id),
            };
            stream.write_all(reply.as_bytes()).unwrap();
        }
        seen
    })
}

fn local_config(listener: &TcpListener) -> ClientConfig {
    ClientConfig {
        motion_port: listener.local_addr().unwrap().port(),
        settle_delay_ms: 0,
        ..ClientConfig::new("127.0.0.1")
    }
}

#[test]
fn test_session_against_fake_controller() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let config = local_config(&listener);
    let controller = spawn_controller(listener);

    let mut robot = RobotClient::connect(&config).unwrap();

    let pose = robot.get_cartesian().unwrap();
    assert_eq!(pose, Pose::new([100.0, 200.0, 300.0], IDENTITY_QUATERNION));

    let targets = vec![
        BufferTarget::Pose(Pose::new([0.0, 0.0, 0.0], IDENTITY_QUATERNION)),
        BufferTarget::Pose(Pose::new([10.0, 0.0, 0.0], IDENTITY_QUATERNION)),
        BufferTarget::Position([10.0, 10.0, 0.0]),
    ];
    robot.buffer_set(&targets).unwrap();
    assert_eq!(robot.buffer_len().unwrap(), 3);
    assert!(robot.buffer_execute(false).unwrap().is_ok());

    robot.clear_buffer().unwrap();
    assert_eq!(robot.buffer_len().unwrap(), 0);

    robot.close().unwrap();
    assert!(robot.is_closed());
    assert!(matches!(robot.get_cartesian(), Err(RmsError::Connection(_))));

    let seen = controller.join().unwrap();
    let ids: Vec<&str> = seen
        .iter()
        .map(|r| r.split_whitespace().next().unwrap())
        .collect();
    assert_eq!(&ids[..4], ["06", "07", "08", "09"]);
    assert_eq!(seen.last().unwrap(), "99 #");
}

#[test]
fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let config = local_config(&listener);
    drop(listener);

    assert!(matches!(
        RobotClient::connect(&config),
        Err(RmsError::Connection(_))
    ));
}
