use clap::Parser;
use eyre::Result;
use penny_arm_lib::{
    init_tracing, ArmCommand, ArmConfig, ArmController, MotionReport, SendResult, TransportError,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_CONFIG: &str = "config/penny_arm.toml";

#[derive(Parser)]
#[command(name = "arm_controller")]
#[command(about = "Drive the Penny arm from joint angles or XYZ targets over serial")]
struct Cli {
    /// Arm configuration file (falls back to $ARM_CONFIG, then config/penny_arm.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Serial port, overrides the config file
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate, overrides the config file
    #[arg(short, long)]
    baud: Option<u32>,

    /// Do not open the serial port; compute and print only
    #[arg(long)]
    offline: bool,

    /// Debug logging, including every line sent to the arm
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<ArmConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("ARM_CONFIG").ok())
        .or_else(|| Path::new(DEFAULT_CONFIG).exists().then(|| DEFAULT_CONFIG.to_string()));

    let mut config = match path {
        Some(path) => {
            let config = ArmConfig::load_from_file(&path)
                .map_err(|e| eyre::eyre!("Failed to load arm config from {}: {}", path, e))?;
            info!("Loaded arm configuration '{}' from {}", config.name, path);
            config
        }
        None => {
            warn!("No arm config found, using built-in defaults");
            ArmConfig::default()
        }
    };

    if let Some(port) = &cli.port {
        config.serial.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }

    config.validate()?;
    Ok(config)
}

fn print_help() {
    println!("Commands:");
    println!("  joints <base> <shoulder> <elbow> <wrist_roll> <wrist_pitch> <gripper>");
    println!("  joint <name> <deg>      - move a single joint");
    println!("  move <x> <y> <z>        - move the end effector (mm)");
    println!("  brush on|off, pump on|off");
    println!("  reset                   - all joints to neutral");
    println!("  status                  - print state as JSON");
    println!("  connect [port [baud]]   - (re)open the serial link");
    println!("  disconnect");
    println!("  quit");
}

fn describe_send(send: &SendResult) -> String {
    match send {
        Ok(_) => "sent".to_string(),
        Err(TransportError::Unavailable) => "not connected".to_string(),
        Err(e) => format!("NOT SENT ({})", e),
    }
}

fn print_report(report: &MotionReport) {
    println!("{}", report.pose);
    println!("  -> {} [{}]", report.command, describe_send(&report.send));
    if report.any_limited() {
        println!("  (some joints were clamped to their limits)");
    }
}

fn connect(
    arm: &mut ArmController,
    port: Option<String>,
    baud_rate: Option<u32>,
) -> Result<(), TransportError> {
    match port {
        Some(port) => {
            let baud_rate = baud_rate.unwrap_or(arm.link_settings().baud_rate);
            arm.connect_to(&port, baud_rate)
        }
        None => arm.connect(),
    }
}

fn process_command(arm: &mut ArmController, command: ArmCommand) -> Result<()> {
    debug!("Processing arm command: {:?}", command);

    match command {
        ArmCommand::JointPosition { joint_angles } => match arm.set_joint_angles(joint_angles) {
            Ok(report) => print_report(&report),
            Err(e) => println!("Rejected: {}", e),
        },
        ArmCommand::SingleJoint { joint, angle } => match arm.set_joint(joint, angle) {
            Ok(report) => print_report(&report),
            Err(e) => println!("Rejected: {}", e),
        },
        ArmCommand::CartesianMove { target } => match arm.set_target_pose(target) {
            Ok(report) => {
                let a = report.joint_angles;
                println!("IK: base {:.0}°, shoulder {:.0}°, elbow {:.0}°", a.0[0], a.0[1], a.0[2]);
                print_report(&report);
            }
            Err(e) => println!("IK Error: {}", e),
        },
        ArmCommand::SetAccessory { accessory, enabled } => {
            let send = arm.set_accessory(accessory, enabled);
            println!(
                "{} {} [{}]",
                accessory,
                if enabled { "on" } else { "off" },
                describe_send(&send)
            );
        }
        ArmCommand::Home => print_report(&arm.reset()),
        ArmCommand::Status => println!("{}", serde_json::to_string_pretty(&arm.status())?),
        ArmCommand::Connect { port, baud_rate } => match connect(arm, port, baud_rate) {
            Ok(()) => {
                println!("Connected");
                // Bring the hardware in line with our state
                let send = arm.sync();
                println!("  [{}]", describe_send(&send));
            }
            Err(e) => println!("Connect failed: {}", e),
        },
        ArmCommand::Disconnect => {
            arm.disconnect();
            println!("Disconnected");
        }
        ArmCommand::Quit => {}
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose);

    info!("Starting arm controller");

    let config = load_config(&cli)?;
    info!(
        "Links L1 = {:.0} mm, L2 = {:.0} mm, limit policy {:?}",
        config.geometry.l1_mm, config.geometry.l2_mm, config.limit_policy
    );

    let mut arm = ArmController::with_system_serial(config)?;

    if cli.offline {
        info!("Offline mode, commands will be computed but not sent");
    } else if let Err(e) = arm.connect() {
        warn!("Continuing without hardware: {}", e);
    }

    // Push the startup pose so the arm and the console agree
    let send = arm.sync();
    println!("{}", arm.pose());
    if let Some(command) = arm.last_command() {
        println!("  -> {} [{}]", command, describe_send(&send));
    }

    print_help();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ArmCommand>() {
            Ok(ArmCommand::Quit) => break,
            Ok(command) => process_command(&mut arm, command)?,
            Err(e) => println!("? {}", e),
        }
    }

    info!("Arm controller shutting down");
    arm.disconnect();
    Ok(())
}
