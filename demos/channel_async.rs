//! Example consuming keyboard notifications from a tokio channel.
//!
//! Run with: cargo run --example channel_async --features tokio

#[cfg(target_os = "windows")]
#[tokio::main]
async fn main() {
    use keyintercept::channel::async_event_channel;
    use keyintercept::{InterceptorEvent, KeyboardInterceptor};
    use std::time::Duration;

    env_logger::init();

    println!("keyintercept async channel example");
    println!("Listening for 10 seconds...\n");

    let interceptor = KeyboardInterceptor::new();
    let (_subscription, mut rx) = async_event_channel(interceptor.subscribers(), 256);
    interceptor.start().expect("Failed to start capture");

    let deadline = tokio::time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = rx.recv() => match event {
                Some(InterceptorEvent::KeyPress(ch)) => println!("Typed: {:?}", ch),
                Some(other) => println!("{:?}", other),
                None => break,
            },
        }
    }

    interceptor.stop().expect("Failed to stop capture");
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("keyintercept only captures keyboard input on Windows");
}
