//! Example consuming keyboard notifications from a channel.
//!
//! Run with: cargo run --example channel_sync

#[cfg(target_os = "windows")]
fn main() {
    use keyintercept::channel::event_channel;
    use keyintercept::{InterceptorEvent, KeyboardInterceptor};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    env_logger::init();

    println!("keyintercept channel example");
    println!("Type something, press Ctrl+C to exit\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let interceptor = KeyboardInterceptor::new();
    let (_subscription, rx) = event_channel(interceptor.subscribers(), 256);
    interceptor.start().expect("Failed to start capture");

    let mut typed = String::new();
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(InterceptorEvent::KeyPress(ch)) => {
                typed.push(ch);
                println!("Typed so far: {:?}", typed);
            }
            Ok(InterceptorEvent::KeyDown(event)) if event.key_code.has_control() => {
                println!("Shortcut: {}", event.key_code);
            }
            Ok(_) => {}
            Err(_) => {
                // Timeout - check exit condition
            }
        }
    }

    interceptor.stop().expect("Failed to stop capture");
    println!("\nYou typed: {:?}", typed);
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("keyintercept only captures keyboard input on Windows");
}
