use clap::Parser;
use loopdns_application::Query;
use loopdns_domain::{CliOverrides, RecordKind};
use loopdns_infrastructure::{EventLoop, LoopSession};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};
use tracing::{info, warn};

mod bootstrap;

#[derive(Parser)]
#[command(name = "loopdns")]
#[command(version = "0.1.0")]
#[command(about = "loopdns - Asynchronous DNS lookups driven by a single-threaded event loop")]
struct Cli {
    /// Record type (A, AAAA, PTR, MX, TXT, SRV, NAPTR, NS)
    #[arg(value_parser = parse_kind)]
    kind: RecordKind,

    /// Domain name, or an IP address for PTR
    name: String,

    /// SRV service label, without the leading underscore
    #[arg(long, requires = "protocol")]
    service: Option<String>,

    /// SRV protocol label, without the leading underscore
    #[arg(long, requires = "service")]
    protocol: Option<String>,

    /// Number of identical queries to submit
    #[arg(short = 'n', long, default_value_t = 1)]
    times: usize,

    /// Cancel every query right after submitting it
    #[arg(long)]
    cancel: bool,

    /// Nameserver address, repeatable (overrides config and NAMESERVERS)
    #[arg(long = "nameserver", value_name = "IP")]
    nameservers: Vec<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Send rounds over the server list before giving up
    #[arg(long)]
    attempts: Option<u32>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_kind(s: &str) -> Result<RecordKind, String> {
    s.parse()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        nameservers: cli.nameservers.clone(),
        timeout_ms: cli.timeout_ms,
        attempts: cli.attempts,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting loopdns v{}", env!("CARGO_PKG_VERSION"));

    let (session, event_loop) = EventLoop::connect(&config.resolver)?;

    let times = cli.times.max(1);
    let recv = Rc::new(Cell::new(0usize));
    let time_start = Instant::now();

    for sent in 1..=times {
        let query = submit(&mut session.borrow_mut(), &cli);
        report(&query, Rc::downgrade(&session), Rc::clone(&recv), sent);

        if cli.cancel && !session.borrow_mut().cancel(&query) {
            warn!(sent, "Query settled before it could be cancelled");
        }
    }

    let idle = event_loop.run_until_idle(&session);
    tokio::pin!(idle);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;
    let mut second = 0u64;

    loop {
        tokio::select! {
            result = &mut idle => {
                result?;
                break;
            }
            _ = &mut ctrl_c => {
                info!(outstanding = session.borrow().active_count(), "Interrupted");
                return Ok(());
            }
            _ = ticker.tick() => {
                second += 1;
                println!("[{second}] - active queries: {}", session.borrow().active_count());
            }
        }
    }

    let elapsed = time_start.elapsed().as_secs_f64();
    println!("\n\nINFO: all the {times} queries terminated");
    println!(
        "INFO: time elapsed: {:.4} seconds ({:.4} queries/second)",
        elapsed,
        times as f64 / elapsed
    );

    Ok(())
}

fn submit(session: &mut LoopSession, cli: &Cli) -> Query {
    let name = cli.name.as_str();
    match cli.kind {
        RecordKind::A => session.submit_a(name),
        RecordKind::AAAA => session.submit_aaaa(name),
        RecordKind::PTR => session.submit_ptr(name),
        RecordKind::MX => session.submit_mx(name),
        RecordKind::TXT => session.submit_txt(name),
        RecordKind::SRV => {
            session.submit_srv(name, cli.service.as_deref(), cli.protocol.as_deref())
        }
        RecordKind::NAPTR => session.submit_naptr(name),
        RecordKind::NS => session.submit_ns(name),
    }
}

/// Continuations run after the loop releases the session, so they may
/// read it back through the weak handle.
fn report(
    query: &Query,
    session: Weak<RefCell<LoopSession>>,
    recv: Rc<Cell<usize>>,
    sent: usize,
) {
    let failed_session = session.clone();
    let on_failure = Rc::clone(&recv);
    query
        .on_success(move |records| {
            recv.set(recv.get() + 1);
            println!("INFO: query #{sent}: result =>");
            for line in records.to_lines() {
                println!("- {line}");
            }
            println!(
                "(recv: {}, active: {})",
                recv.get(),
                active_count(&session)
            );
        })
        .on_failure(move |error| {
            on_failure.set(on_failure.get() + 1);
            println!(
                "INFO: query #{sent}: error => {} ({error}) (recv: {}, active: {})",
                error.as_str(),
                on_failure.get(),
                active_count(&failed_session)
            );
        });
}

fn active_count(session: &Weak<RefCell<LoopSession>>) -> usize {
    session
        .upgrade()
        .map(|session| session.borrow().active_count())
        .unwrap_or(0)
}
