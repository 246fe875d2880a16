#![forbid(unsafe_code)]
use clap::{Parser, Subcommand};
use roulement::{
    check::{check_schedule, operating_days_for, Finding},
    cp::BranchBoundSolver,
    io,
    model::{Month, MonthlySchedule},
    planner::{MonthlyPlanner, PlanInputs, PlanOutcome, PlannerOptions},
    storage::{JsonStorage, Storage},
};
use std::time::Duration;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification mensuelle (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du référentiel (employés, postes, configurations, absences)
    #[arg(long, global = true, default_value = "store.json")]
    data: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer le planning d'un mois pour un groupe
    Generate {
        /// Mois cible, format YYYY-MM
        #[arg(long)]
        month: String,
        #[arg(long)]
        group: String,
        /// Profil idéal JSON (objectif souple, optionnel)
        #[arg(long)]
        profile: Option<String>,
        /// Budget solveur en secondes
        #[arg(long, default_value_t = 60)]
        time_limit: u64,
        /// Artefact JSON du planning
        #[arg(long, default_value = "schedule.json")]
        out: String,
        /// Export CSV optionnel
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vérifier un planning persisté contre le référentiel courant
    Check {
        #[arg(long, default_value = "schedule.json")]
        schedule: String,
        /// Export CSV des constats (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Lister les jours ouvrés retenus pour un mois
    Days {
        /// Mois cible, format YYYY-MM
        #[arg(long)]
        month: String,
        #[arg(long)]
        group: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Generate {
            month,
            group,
            profile,
            time_limit,
            out,
            out_csv,
        } => {
            let month: Month = month.parse().map_err(anyhow::Error::msg)?;
            let snapshot = io::load_store(&cli.data)?;
            let ideal = match profile {
                Some(path) => Some(io::load_profile(path)?),
                None => None,
            };
            let inputs = PlanInputs::from_snapshot(&snapshot, month, &group, ideal);
            let options = PlannerOptions {
                time_limit: Duration::from_secs(time_limit),
                ..PlannerOptions::default()
            };
            let planner = MonthlyPlanner::new(inputs).with_options(options);
            let PlanOutcome {
                assignment,
                diagnostics,
            } = planner.run(&BranchBoundSolver::new())?;

            let mut schedule = MonthlySchedule::new(&group, month, assignment);
            schedule.run_id = diagnostics.run_id.clone();
            let storage = JsonStorage::open(&out)?;
            storage.save(&schedule)?;
            if let Some(path) = out_csv {
                io::export_schedule_csv(path, &schedule, &snapshot)?;
            }
            println!("{}", serde_json::to_string_pretty(&diagnostics)?);
            0
        }
        Commands::Check { schedule, report } => {
            let snapshot = io::load_store(&cli.data)?;
            let storage = JsonStorage::open(&schedule)?;
            let schedule = storage.load()?;
            let findings =
                check_schedule(&snapshot, &schedule, &PlannerOptions::default_transitions());
            if findings.is_empty() {
                println!("OK: no findings");
                0
            } else {
                eprintln!("Found {} finding(s)", findings.len());
                if let Some(path) = report {
                    // CSV simple
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["kind", "date", "employee", "shift", "detail"])?;
                    for finding in &findings {
                        let (date, employee, shift, detail) = describe(finding);
                        w.write_record([
                            finding.kind(),
                            date.as_str(),
                            employee.as_str(),
                            shift.as_str(),
                            detail.as_str(),
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = constats présents
                2
            }
        }
        Commands::Days { month, group } => {
            let month: Month = month.parse().map_err(anyhow::Error::msg)?;
            let snapshot = io::load_store(&cli.data)?;
            for day in operating_days_for(&snapshot, &group, month) {
                println!("{day}");
            }
            0
        }
    };

    std::process::exit(code);
}

/// Colonnes (date, employé, poste, détail) d'un constat, vides si sans objet.
fn describe(finding: &Finding) -> (String, String, String, String) {
    match finding {
        Finding::CoverageGap {
            date,
            shift_type,
            assigned,
            required,
        } => (
            date.to_string(),
            String::new(),
            shift_type.to_string(),
            format!("{assigned} assigned, {required} required"),
        ),
        Finding::CoverageExcess {
            date,
            shift_type,
            assigned,
            required,
        } => (
            date.to_string(),
            String::new(),
            shift_type.to_string(),
            format!("{assigned} assigned, {required} required"),
        ),
        Finding::DoubleBooking {
            date,
            employee,
            count,
        } => (
            date.to_string(),
            employee.to_string(),
            String::new(),
            format!("{count} shifts on one day"),
        ),
        Finding::ForbiddenAdjacency {
            date,
            employee,
            prev,
            next,
        } => (
            date.to_string(),
            employee.to_string(),
            String::new(),
            format!("{prev} then {next}"),
        ),
        Finding::BalanceBreach {
            employee,
            total,
            floor,
            ceiling,
        } => (
            String::new(),
            employee.to_string(),
            String::new(),
            format!("{total} outside [{floor}, {ceiling}]"),
        ),
        Finding::UnknownEmployee { employee } => (
            String::new(),
            employee.to_string(),
            String::new(),
            "not an active employee of the group".to_string(),
        ),
        Finding::UnknownShiftType { shift_type } => (
            String::new(),
            String::new(),
            shift_type.to_string(),
            "unknown shift type for the group".to_string(),
        ),
    }
}
