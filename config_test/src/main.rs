use clap::Parser;
use eyre::Result;
use penny_arm_lib::{
    init_tracing, ArmConfig, ArmKinematics, CalibrationMapper, CartesianPose, JointAngles,
    MachineCommand,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "config_test")]
#[command(about = "Test Penny arm configuration files")]
struct Cli {
    #[arg(short, long, default_value = "config/penny_arm.toml")]
    config: String,

    /// Optional IK probe target, "x,y,z" in mm
    #[arg(long)]
    probe: Option<String>,

    /// Debug logging, including every line sent to the arm
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose);

    info!("Testing configuration file: {}", cli.config);
    test_config(&cli.config, cli.probe.as_deref())?;

    Ok(())
}

fn parse_probe(probe: &str) -> Result<CartesianPose> {
    let coords = probe
        .split(',')
        .map(|c| c.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()?;

    match coords.as_slice() {
        [x, y, z] => Ok(CartesianPose::new(*x, *y, *z)),
        _ => Err(eyre::eyre!("Probe must be x,y,z, got '{}'", probe)),
    }
}

fn test_config(config_path: &str, probe: Option<&str>) -> Result<()> {
    println!("Testing configuration file: {}", config_path);

    let config = match ArmConfig::load_from_file(config_path) {
        Ok(config) => {
            println!("✓ Arm configuration loaded successfully");
            println!("  Name: {}", config.name);
            println!("  Serial: {} @ {} baud", config.serial.port, config.serial.baud_rate);
            println!(
                "  Links: L1 = {} mm, L2 = {} mm",
                config.geometry.l1_mm, config.geometry.l2_mm
            );
            for joint in &config.joints {
                println!(
                    "  {:<12} [{:>5.1}, {:>5.1}] offset {:+.1}{}",
                    joint.name.name(),
                    joint.min_angle,
                    joint.max_angle,
                    joint.offset,
                    if joint.inverted { " inverted" } else { "" }
                );
            }

            match config.validate() {
                Ok(_) => println!("✓ Configuration validation passed"),
                Err(e) => {
                    println!("✗ Configuration validation failed: {}", e);
                    return Err(e);
                }
            }
            config
        }
        Err(e) => {
            println!("✗ Failed to load arm configuration: {}", e);
            return Err(e);
        }
    };

    // Neutral pose through the whole pipeline
    let kinematics = ArmKinematics::new(config.geometry);
    let calibration = CalibrationMapper::from_config(&config)?;
    let neutral = JointAngles::uniform(config.neutral_angle_deg);
    let pose = kinematics.forward(&neutral);
    let command = MachineCommand::new(calibration.calibrate(&neutral), Default::default());

    println!("✓ Forward kinematics at neutral: {}", pose);
    println!("  Neutral wire line: {}", command);
    println!(
        "  Reach: [{:.1}, {:.1}] mm",
        kinematics.geometry().min_reach(),
        kinematics.geometry().max_reach()
    );

    if let Some(probe) = probe {
        let target = parse_probe(probe)?;
        match kinematics.inverse(&target) {
            Ok(solution) => {
                let angles = solution.apply_to(&neutral);
                println!(
                    "✓ IK for {}: base {:.0}°, shoulder {:.0}°, elbow {:.0}°",
                    target, angles.0[0], angles.0[1], angles.0[2]
                );
                println!("  FK of rounded angles: {}", kinematics.forward(&angles));
            }
            Err(e) => println!("⚠ IK for {}: {}", target, e),
        }
    }

    println!("\nAll configuration tests passed!");
    Ok(())
}
