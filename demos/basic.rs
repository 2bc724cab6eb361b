//! Basic example printing key codes and typed characters.
//!
//! Run with: cargo run --example basic
//!
//! Try a dead key (e.g. `´` then `e` on a German or French layout) to see
//! the composed character reported once.

#[cfg(target_os = "windows")]
fn main() {
    use keyintercept::{KeyEvent, KeyboardInterceptor};
    use std::sync::mpsc;

    env_logger::init();

    println!("keyintercept basic example");
    println!("Press Ctrl+C to exit\n");

    let interceptor = KeyboardInterceptor::new();
    interceptor.on_key_down(|event: &KeyEvent| {
        println!("Key down: {} (vk 0x{:02X})", event.key_code, event.key_code.virtual_key());
    });
    interceptor.on_key_up(|event: &KeyEvent| {
        println!("Key up:   {}", event.key_code);
    });
    interceptor.on_key_press(|ch: char| {
        println!("Typed:    {:?}", ch);
    });

    if let Err(e) = interceptor.start() {
        eprintln!("Error: {}", e);
        return;
    }

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("Error setting Ctrl-C handler");
    let _ = rx.recv();

    if let Err(e) = interceptor.stop() {
        eprintln!("Error: {}", e);
    }
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("keyintercept only captures keyboard input on Windows");
}
