use clap::{App, Arg, ArgMatches};
use colored::*;
use goosebus::breaker::BreakerState;
use goosebus::channel::{ChannelGuard, FileChannel};
use goosebus::classify::Band;
use goosebus::config::LinkConfig;
use goosebus::runtime::{run_subscriber, shutdown_signal};
use goosebus::subscriber::Subscriber;
use goosebus::view::{BreakerView, COMMAND_ACTIVE};
use std::path::Path;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("breaker-ied")
        .version("0.1.0")
        .author("Substation Automation Engineering Team")
        .about("🔌 Breaker IED - follows relay trip/close intent and reports breaker position")
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
                .help("Poll period in milliseconds")
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
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["table", "json"])
                .default_value("table"),
        )
        .arg(
            Arg::with_name("release-channel")
                .long("release-channel")
                .help("Remove the channel on exit even though the relay owns it"),
        )
        .get_matches();

    let config = load_config(&matches)?;
    let json = matches.value_of("format") == Some("json");

    println!("{}", "🔌 Breaker IED Monitor - GOOSE Subscriber".bright_white().bold());
    println!("==========================================");
    println!("   Interface: {}", config.interface.bright_cyan());
    println!("   Channel:   {}", config.channel_path.display().to_string().bright_cyan());
    println!("   Period:    {} ms", config.tick_period_ms);

    let channel = FileChannel::new(&config.channel_path);
    let mut guard = ChannelGuard::new(channel.clone());
    if !config.releases_on_exit(false) {
        guard.disarm();
    }

    let subscriber = Subscriber::new(channel);
    let initial_view = subscriber.view();
    print_view(&initial_view, json)?;

    let (view_tx, view_rx) = watch::channel(initial_view);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let subscriber_task = tokio::spawn(run_subscriber(
        subscriber,
        config.tick_period(),
        view_tx,
        shutdown_rx,
    ));
    let printer_task = tokio::spawn(print_views(view_rx, json));

    println!("{}", "📡 Monitoring GOOSE messages (Press Ctrl+C to stop)".bright_blue());
    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    let subscriber = subscriber_task.await?;
    printer_task.abort();

    let stats = subscriber.get_stats();
    println!(
        "🛑 Breaker IED stopped: breaker {}, {} updates, {} discarded, {} polls",
        subscriber.breaker_state(),
        stats.updates,
        stats.discarded_records,
        stats.polls
    );

    drop(guard);
    Ok(())
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
    if matches.is_present("release-channel") {
        config.release_on_exit = Some(true);
    }

    config.validate()?;
    Ok(config)
}

async fn print_views(mut views: watch::Receiver<BreakerView>, json: bool) {
    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        if let Err(e) = print_view(&view, json) {
            eprintln!("{} {}", "❌".red(), e);
        }
    }
}

fn print_view(view: &BreakerView, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(view)?);
        return Ok(());
    }

    let breaker = match view.breaker {
        BreakerState::Closed => view.breaker.label().green().bold(),
        BreakerState::Open => view.breaker.label().red().bold(),
    };
    let trip = if view.trip_status == COMMAND_ACTIVE {
        view.trip_status.red().on_yellow()
    } else {
        view.trip_status.normal()
    };
    let close = if view.close_status == COMMAND_ACTIVE {
        view.close_status.green()
    } else {
        view.close_status.normal()
    };

    let (current, voltage, frequency) = match view.bands {
        Some(bands) => (
            paint(&view.current, bands.current),
            paint(&view.voltage, bands.voltage),
            paint(&view.frequency, bands.frequency),
        ),
        None => (view.current.normal(), view.voltage.normal(), view.frequency.normal()),
    };

    println!(
        "[{:>8}] Breaker {:<6} | Trip {:<8} Close {:<8} | {} (element {}) | {} {} {}",
        view.last_update,
        breaker,
        trip,
        close,
        view.fault_type.bright_white(),
        view.protection_element,
        current,
        voltage,
        frequency
    );
    Ok(())
}

fn paint(text: &str, band: Band) -> ColoredString {
    match band {
        Band::Normal => text.green(),
        Band::Abnormal => text.yellow(),
        Band::Fault => text.red(),
    }
}
