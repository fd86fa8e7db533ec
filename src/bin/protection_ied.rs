use clap::{App, Arg, ArgMatches};
use colored::*;
use goosebus::channel::{ChannelGuard, FileChannel};
use goosebus::classify::Band;
use goosebus::command::{parse_command, OperatorCommand};
use goosebus::config::LinkConfig;
use goosebus::publisher::{ProtectionIntent, Publisher};
use goosebus::runtime::{run_publisher, shutdown_signal, OPERATOR_COMMAND_BUFFER_SIZE};
use goosebus::snapshot::FaultKind;
use std::io::BufRead;
use std::path::Path;
use tokio::sync::{mpsc, watch};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("protection-ied")
        .version("0.1.0")
        .author("Substation Automation Engineering Team")
        .about("⚡ Protection IED - publishes trip/close intent and measurements")
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("channel")
                .short("c")
                .long("channel")
                .value_name("PATH")
                .help("Exchange channel path")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("period")
                .short("p")
                .long("period-ms")
                .value_name("MS")
                .help("Publish period in milliseconds")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(ms) if ms > 0 => Ok(()),
                    _ => Err("Period must be a positive number of milliseconds".into()),
                }),
        )
        .arg(
            Arg::with_name("interface")
                .short("i")
                .long("interface")
                .value_name("NAME")
                .help("Interface label shown in the banner")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("protection-logic")
                .long("protection-logic")
                .help("Derive trips from measurements before publishing"),
        )
        .arg(
            Arg::with_name("keep-channel")
                .long("keep-channel")
                .help("Leave the channel in place on exit"),
        )
        .arg(Arg::with_name("trip").long("trip").help("Start with trip asserted"))
        .arg(Arg::with_name("close").long("close").help("Start with close asserted"))
        .arg(
            Arg::with_name("fault-type")
                .long("fault-type")
                .value_name("CODE")
                .help("Fault type (0=No Fault, 1=Overcurrent, 2=Differential, 3=Distance)")
                .takes_value(true)
                .possible_values(&["0", "1", "2", "3"]),
        )
        .arg(
            Arg::with_name("element")
                .long("element")
                .value_name("ANSI")
                .help("Protection element number")
                .takes_value(true)
                .validator(|v| match v.parse::<i32>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Element must be an integer".into()),
                }),
        )
        .arg(measurement_arg("current", "Current in A"))
        .arg(measurement_arg("voltage", "Voltage in V"))
        .arg(measurement_arg("frequency", "Frequency in Hz"))
        .after_help(
            "Operator commands are read from stdin as JSON lines, e.g.\n  \
             {\"SetTrip\":{\"active\":true}}\n  {\"SetCurrent\":{\"amps\":3600.0}}\n  \"Reset\"",
        )
        .get_matches();

    let config = load_config(&matches)?;
    let intent = initial_intent(&matches)?;

    println!("{}", "⚡ Protection IED - GOOSE Publisher".bright_white().bold());
    println!("====================================");
    println!("   Interface: {}", config.interface.bright_cyan());
    println!("   Channel:   {}", config.channel_path.display().to_string().bright_cyan());
    println!("   Period:    {} ms", config.tick_period_ms);
    println!(
        "   Protection logic: {}",
        if config.protection_logic { "ON".green() } else { "OFF".yellow() }
    );
    print_intent(&intent);

    let channel = FileChannel::new(&config.channel_path);
    // Released on every exit path below, including early returns
    let mut guard = ChannelGuard::new(channel.clone());
    if !config.releases_on_exit(true) {
        guard.disarm();
    }

    let mut publisher = Publisher::with_intent(channel, intent);
    publisher.set_protection_logic(config.protection_logic);

    let (command_tx, command_rx) = mpsc::channel(OPERATOR_COMMAND_BUFFER_SIZE);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Blocking stdin reads live on a plain thread so they never hold up shutdown
    std::thread::spawn(move || read_operator_commands(&command_tx));

    let publisher_task = tokio::spawn(run_publisher(
        publisher,
        config.tick_period(),
        command_rx,
        shutdown_rx,
    ));

    println!("{}", "📡 Publishing GOOSE messages (Press Ctrl+C to stop)".bright_green());
    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    let publisher = publisher_task.await?;
    let stats = publisher.get_stats();
    println!(
        "🛑 Protection IED stopped: {} ticks, {} written, {} failed, stNum {}",
        stats.ticks, stats.records_written, stats.write_failures, stats.st_num
    );

    drop(guard);
    Ok(())
}

fn measurement_arg<'a, 'b>(name: &'a str, help: &'b str) -> Arg<'a, 'b> {
    Arg::with_name(name)
        .long(name)
        .value_name("VALUE")
        .help(help)
        .takes_value(true)
        .allow_hyphen_values(true)
        .validator(|v| match v.parse::<f64>() {
            Ok(_) => Ok(()),
            Err(_) => Err("Measurement must be a number".into()),
        })
}

fn load_config(matches: &ArgMatches<'_>) -> Result<LinkConfig, Box<dyn std::error::Error>> {
    let mut config = LinkConfig::load(matches.value_of("config").map(Path::new))?;

    if let Some(path) = matches.value_of("channel") {
        config.channel_path = path.into();
    }
    if let Some(period) = matches.value_of("period") {
        config.tick_period_ms = period.parse()?;
    }
    if let Some(interface) = matches.value_of("interface") {
        config.interface = interface.to_string();
    }
    if matches.is_present("protection-logic") {
        config.protection_logic = true;
    }
    if matches.is_present("keep-channel") {
        config.release_on_exit = Some(false);
    }

    config.validate()?;
    Ok(config)
}

fn initial_intent(matches: &ArgMatches<'_>) -> Result<ProtectionIntent, Box<dyn std::error::Error>> {
    let mut intent = ProtectionIntent {
        trip: matches.is_present("trip"),
        close: matches.is_present("close"),
        ..ProtectionIntent::default()
    };

    if let Some(code) = matches.value_of("fault-type") {
        intent.fault_type = FaultKind::from_code(code.parse()?);
    }
    if let Some(element) = matches.value_of("element") {
        intent.protection_element = element.parse()?;
    }
    if let Some(current) = matches.value_of("current") {
        intent.current = current.parse()?;
    }
    if let Some(voltage) = matches.value_of("voltage") {
        intent.voltage = voltage.parse()?;
    }
    if let Some(frequency) = matches.value_of("frequency") {
        intent.frequency = frequency.parse()?;
    }

    Ok(intent)
}

fn read_operator_commands(commands: &mpsc::Sender<OperatorCommand>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read operator input: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_command(trimmed) {
            Ok(command) => {
                println!("{} {:?}", "✅".green(), command);
                if commands.blocking_send(command).is_err() {
                    break;
                }
            }
            Err(e) => {
                eprintln!("{} {}", "❌".red(), e.to_string().bright_red());
            }
        }
    }
}

fn paint(text: String, band: Band) -> ColoredString {
    match band {
        Band::Normal => text.green(),
        Band::Abnormal => text.yellow(),
        Band::Fault => text.red(),
    }
}

fn print_intent(intent: &ProtectionIntent) {
    let bands = intent.bands();
    println!(
        "   Trip: {}  Close: {}",
        if intent.trip { "ACTIVE".red() } else { "INACTIVE".white() },
        if intent.close { "ACTIVE".green() } else { "INACTIVE".white() }
    );
    println!(
        "   Fault: {} (element {})",
        intent.fault_type.label().bright_white(),
        intent.protection_element
    );
    println!(
        "   Current: {}  Voltage: {}  Frequency: {}",
        paint(format!("{:.1} A", intent.current), bands.current),
        paint(format!("{:.0} V", intent.voltage), bands.voltage),
        paint(format!("{:.1} Hz", intent.frequency), bands.frequency)
    );
}
