use apc_smartups_modbus::driver::InMemoryVariableStore;
use apc_smartups_modbus::transport::Config;
use apc_smartups_modbus::SmartUpsDriver;
use clap::Parser;
use log::LevelFilter;

mod replay;

use replay::ReplayTransport;

#[derive(Parser)]
#[command(about = "Polls or commands an APC Smart-UPS over the MODBUS-over-HID transport")]
struct Args {
    /// Path to a replay script: newline-delimited pairs of 64-byte hex reports,
    /// "TX <hex>" lines are ignored, "RX <hex>" lines are queued as responses.
    #[arg(long)]
    replay: String,

    /// MODBUS slave address.
    #[arg(long, default_value_t = 1)]
    slave: u8,

    /// Issue a single command after polling, e.g. "outlet.1.load.off" or "ups.delay.start=30".
    #[arg(long)]
    cmd: Option<String>,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let mut cfg = Config::default();
    cfg.slave_addr = args.slave;

    let transport = ReplayTransport::load(&args.replay)?;
    let mut driver = SmartUpsDriver::new(transport, cfg);

    let mut store = InMemoryVariableStore::new();
    driver.register(&mut store);
    driver.poll(&mut store);

    for name in [
        "output.voltage",
        "output.current",
        "battery.runtime",
        "outlet.1.status",
    ] {
        if let Some(value) = store.get(name) {
            println!("{name} = {value}");
        }
    }

    if let Some(cmd) = args.cmd {
        let (name, value) = match cmd.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.parse::<f64>()?)),
            None => (cmd, None),
        };
        driver.instcmd(&name, value)?;
        println!("instcmd {name} ok");
    }

    Ok(())
}
