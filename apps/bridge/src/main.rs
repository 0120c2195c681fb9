//! pumpctl 桥接程序主入口
//!
//! 打开 ViSi-Genie 触摸屏串口，连接泵控制器，把触摸事件翻译为泵命令，
//! 空闲时在 Cool Gauge 上播放往复动画。

use anyhow::{Context, Result};
use clap::Parser;
use pumpctl_display::GenieSerialDisplay;
use pumpctl_driver::{BridgeBuilder, DEFAULT_PUMP_ADDR, PipelineConfig, PumpLinkConfig};
use std::num::NonZeroUsize;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 触摸屏 ↔ 泵控制器桥接
///
/// 不带任何参数运行时使用出厂布线：/dev/ttyAMA0 @ 115200，泵在 192.168.0.116:23
#[derive(Parser, Debug)]
#[command(name = "pumpctl-bridge")]
#[command(about = "Bridge a ViSi-Genie touchscreen to a TCP pump controller", long_about = None)]
struct Args {
    /// 泵控制器地址
    ///
    /// 格式: HOST:PORT (例如: 192.168.0.116:23)
    #[arg(long, default_value = DEFAULT_PUMP_ADDR)]
    pump_addr: String,

    /// 显示屏串口设备
    #[arg(long, default_value = "/dev/ttyAMA0")]
    device: String,

    /// 串口波特率（bps）
    ///
    /// 支持: 9600, 19200, 38400, 57600, 115200, 230400
    #[arg(long, default_value = "115200")]
    baud: u32,

    /// 无事件时的轮询间隔（毫秒）
    #[arg(long, default_value = "10")]
    poll_interval_ms: u64,

    /// 动画帧间隔（毫秒）
    #[arg(long, default_value = "10")]
    animation_interval_ms: u64,

    /// 单次泵应答最多读取的字节数（至少为 1）
    #[arg(long, default_value = "80")]
    max_reply_len: NonZeroUsize,

    /// 输出原始命令、应答和每条事件（debug 级别）
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    // `pumpctl` 按前缀匹配所有 pumpctl_* crate
    let filter =
        EnvFilter::from_default_env().add_directive(format!("pumpctl={}", level).parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let display = Arc::new(
        GenieSerialDisplay::open(&args.device, args.baud)
            .with_context(|| format!("Failed to open display on {}", args.device))?,
    );
    info!("Display opened on {} @ {} bps", args.device, args.baud);

    let bridge = BridgeBuilder::new()
        .pump_addr(args.pump_addr.clone())
        .link_config(PumpLinkConfig {
            max_reply_len: args.max_reply_len.get(),
        })
        .pipeline_config(PipelineConfig {
            poll_interval_ms: args.poll_interval_ms,
            animation_interval_ms: args.animation_interval_ms,
        })
        .build(display.clone())?;

    // 第一次 Ctrl+C 请求优雅退出；分发循环可能卡在泵读取上，第二次直接退出
    let shutdown = bridge.shutdown_handle();
    let interrupted = AtomicBool::new(false);
    ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::AcqRel) {
            eprintln!("\nReceived second interrupt signal. Exiting now.");
            process::exit(130);
        }
        eprintln!("\nReceived interrupt signal. Shutting down...");
        shutdown.shutdown();
    })
    .context("Failed to set signal handler")?;

    let metrics = bridge.metrics();
    let result = bridge.run();

    let link = display.stats().snapshot();
    info!(
        "Display link: {} replies ({} dropped), {} ACK, {} NAK, {} bytes discarded",
        link.replies, link.replies_dropped, link.acks, link.naks, link.bytes_discarded
    );
    result?;

    let snapshot = metrics.snapshot();
    info!(
        "Exited cleanly after {} events and {} pump commands",
        snapshot.replies_total, snapshot.commands_sent
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("Failed to initialise logging: {}", e);
        process::exit(1);
    }

    eprintln!(
        "pumpctl-bridge v{} (display {}, pump {})",
        env!("CARGO_PKG_VERSION"),
        args.device,
        args.pump_addr
    );

    if let Err(e) = run(args) {
        error!("{:#}", e);
        process::exit(1);
    }
}
