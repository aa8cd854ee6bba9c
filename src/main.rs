//! `framecast` binary: chunked and single-packet sensor frame streaming.

mod cli;

use clap::Parser;
use cli::{Cli, Command, ReceiveArgs, SendArgs, ShutdownArg, SourceArgs, StreamReceiveArgs, StreamSendArgs};
use framecast::{
    Result,
    config::{Config, ShutdownPolicy},
    consumer::Consumer,
    frame::RowWidth,
    producer::ProducerRuntime,
    stream::{StreamReceiver, StreamSenderRuntime},
    synthetic::SyntheticCloud,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli.command);
    config.validate()?;

    #[cfg(feature = "metrics")]
    if let Some(addr) = cli.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!(%addr, "serving prometheus metrics");
    }
    #[cfg(not(feature = "metrics"))]
    if cli.metrics_addr.is_some() {
        warn!("built without the metrics feature; ignoring --metrics-addr");
    }

    match cli.command {
        Command::Send(args) => send(&config, &args.source).await,
        Command::Receive(_) => receive(&config).await,
        Command::StreamSend(args) => stream_send(&config, &args.source).await,
        Command::StreamReceive(_) => stream_receive(&config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn apply_overrides(config: &mut Config, command: &Command) {
    match command {
        Command::Send(SendArgs {
            peer,
            feedback_bind,
            rows_per_chunk,
            source,
        }) => {
            let producer = &mut config.producer;
            override_with(&mut producer.data_peer, *peer);
            override_with(&mut producer.feedback_bind, *feedback_bind);
            override_with(&mut producer.max_rows_per_chunk, *rows_per_chunk);
            override_with(&mut producer.send_rate_hz, source.rate);
        }
        Command::Receive(ReceiveArgs {
            bind,
            group,
            feedback,
            max_lag,
            on_shutdown,
        }) => {
            let consumer = &mut config.consumer;
            override_with(&mut consumer.data_bind, *bind);
            if group.is_some() {
                consumer.multicast_group = *group;
            }
            override_with(&mut consumer.feedback_peer, *feedback);
            override_with(&mut consumer.max_frame_lag, *max_lag);
            override_with(
                &mut consumer.shutdown_policy,
                on_shutdown.map(|arg| match arg {
                    ShutdownArg::Flush => ShutdownPolicy::Flush,
                    ShutdownArg::Discard => ShutdownPolicy::Discard,
                }),
            );
        }
        Command::StreamSend(StreamSendArgs {
            peer,
            feedback_bind,
            name,
            source,
        }) => {
            let sender = &mut config.stream_sender;
            override_with(&mut sender.data_peer, *peer);
            override_with(&mut sender.feedback_bind, *feedback_bind);
            override_with(&mut sender.name, name.clone());
            override_with(&mut sender.send_rate_hz, source.rate);
        }
        Command::StreamReceive(StreamReceiveArgs {
            bind,
            group,
            feedback,
        }) => {
            let receiver = &mut config.stream_receiver;
            override_with(&mut receiver.data_bind, *bind);
            if group.is_some() {
                receiver.multicast_group = *group;
            }
            override_with(&mut receiver.feedback_peer, *feedback);
        }
    }
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("interrupt received; shutting down");
        token.cancel();
    });
}

fn synthetic_source(args: &SourceArgs) -> SyntheticCloud {
    let row_width = if args.xyz_only { RowWidth::Xyz } else { RowWidth::Xyzi };
    SyntheticCloud::new(args.points, row_width)
}

async fn send(config: &Config, source: &SourceArgs) -> Result<()> {
    let mut runtime = ProducerRuntime::connect(&config.producer).await?;
    let token = runtime.shutdown_token();
    cancel_on_ctrl_c(token.clone());

    let frames = synthetic_source(source);
    match source.frames {
        Some(count) => runtime.run(frames.take(count)).await,
        None => runtime.run(frames).await,
    };
    if !token.is_cancelled() && !runtime.settle(config.producer.ack_timeout()).await {
        warn!("some frames were still unacknowledged when sending finished");
    }
    let summary = runtime.shutdown().await;
    println!("{summary}");
    Ok(())
}

async fn receive(config: &Config) -> Result<()> {
    let (consumer, mut frames) = Consumer::bind(&config.consumer).await?;
    let token = CancellationToken::new();
    cancel_on_ctrl_c(token.clone());

    let drain = async {
        while let Some(frame) = frames.recv().await {
            debug!(
                frame_id = %frame.frame_id(),
                bytes = frame.payload().byte_len(),
                complete = frame.is_complete(),
                "frame delivered"
            );
        }
    };
    let (summary, ()) = tokio::join!(consumer.run(token), drain);
    println!("{summary}");
    Ok(())
}

async fn stream_send(config: &Config, source: &SourceArgs) -> Result<()> {
    let mut runtime = StreamSenderRuntime::connect(&config.stream_sender).await?;
    cancel_on_ctrl_c(runtime.shutdown_token());

    let frames = synthetic_source(source).map(framecast::frame::Payload::into_bytes);
    match source.frames {
        Some(count) => runtime.run(frames.take(count)).await,
        None => runtime.run(frames).await,
    };
    let summary = runtime.shutdown().await;
    println!("{summary}");
    Ok(())
}

async fn stream_receive(config: &Config) -> Result<()> {
    let (receiver, mut deliveries) = StreamReceiver::bind(&config.stream_receiver).await?;
    let token = CancellationToken::new();
    cancel_on_ctrl_c(token.clone());

    let drain = async {
        while let Some(delivery) = deliveries.recv().await {
            debug!(
                sequence = delivery.sequence,
                name = %delivery.name,
                bytes = delivery.payload.len(),
                "packet delivered"
            );
        }
    };
    let (summary, ()) = tokio::join!(receiver.run(token), drain);
    println!("{summary}");
    Ok(())
}
