//! Pair a WLED device by address, list its effects and run one
//!
//! ```text
//! cargo run -p wled-sdk --example control_strip -- 192.168.1.50 rainbow
//! ```

use std::time::Duration;

use wled_sdk::{init_logging, Capability, FlowAction, LoggingMode, SdkError, WledSystem};

#[tokio::main]
async fn main() -> Result<(), SdkError> {
    if let Err(e) = init_logging(LoggingMode::Development) {
        eprintln!("logging disabled: {}", e);
    }

    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| "192.168.1.50".to_string());
    let query = args.next().unwrap_or_default();

    let system = WledSystem::new()?;
    let strip = system.pair(&address).await?;
    println!("Paired {} ({})", strip.name, strip.id);

    let effects = FlowAction::SetEffect.autocomplete(&strip, &query).await;
    for effect in &effects {
        println!("  {:>3}  {}", effect.id, effect.name);
    }

    if let Some(effect) = effects.first() {
        strip.set(Capability::OnOff, true.into()).await?;
        FlowAction::SetEffect.run(&strip, &effect.id).await?;
        println!("Running {}", effect.name);
    }

    tokio::time::sleep(Duration::from_secs(6)).await;
    println!("State: {:?}", strip.snapshot());

    system.shutdown();
    Ok(())
}
