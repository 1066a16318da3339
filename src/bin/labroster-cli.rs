#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use labroster::{
    calendar::{leave_for_horizon, Horizon},
    config::{load_config, RosterConfig},
    generate_roster, io,
    scheduler::{validate_roster, RosterOutcome},
    storage::{JsonStorage, Storage},
    Staff,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planning de service d'un laboratoire multi-unités (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer le planning d'un mois
    Generate {
        /// CSV du personnel (`code,name,category,weekend,units,night_eligible`)
        #[arg(long)]
        staff: String,
        /// CSV des congés (`code,start,end`)
        #[arg(long)]
        leave: Option<String>,
        /// JSON de couverture et classements ; sinon classements intégrés sans couverture
        #[arg(long)]
        config: Option<String>,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// Jour férié (YYYY-MM-DD), répétable
        #[arg(long = "holiday")]
        holidays: Vec<String>,
        /// JSON de résultat (matrice, manques, diagnostics, résumé)
        #[arg(long, default_value = "roster.json")]
        out: String,
        /// Feuille de service CSV
        #[arg(long)]
        out_csv: Option<String>,
        /// CSV des manques de couverture
        #[arg(long)]
        deficiencies: Option<String>,
    },

    /// Revérifier un planning stocké contre toutes les règles dures
    Validate {
        #[arg(long, default_value = "roster.json")]
        roster: String,
        #[arg(long)]
        staff: String,
        #[arg(long)]
        leave: Option<String>,
        #[arg(long)]
        config: Option<String>,
        #[arg(long = "holiday")]
        holidays: Vec<String>,
    },

    /// Lister le personnel par catégorie
    Staff {
        #[arg(long)]
        staff: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Generate {
            staff,
            leave,
            config,
            year,
            month,
            holidays,
            out,
            out_csv,
            deficiencies,
        } => {
            let staff = io::import_staff_csv(staff)?;
            let config = read_config(config.as_deref())?;
            let horizon = Horizon::month(year, month)?.with_holidays(parse_dates(&holidays)?);
            let leave = match leave {
                Some(path) => leave_for_horizon(&horizon, &io::import_leave_csv(path)?),
                None => Vec::new(),
            };

            let outcome = generate_roster(&staff, &leave, &horizon, &config);
            JsonStorage::open(&out)?.save(&outcome)?;
            for d in &outcome.diagnostics {
                eprintln!("note: {}", d.message);
            }

            if !outcome.is_exportable() {
                report_violations(&outcome);
                eprintln!("roster not exported: {} violation(s)", outcome.violations.len());
                2
            } else {
                if let Some(path) = out_csv {
                    io::export_roster_csv(path, &outcome.matrix)?;
                }
                if let Some(path) = deficiencies {
                    io::export_deficiencies_csv(path, &outcome.deficiencies)?;
                }
                if outcome.deficiencies.is_empty() {
                    println!(
                        "OK: {} staff x {} days, all coverage met",
                        outcome.matrix.staff.len(),
                        outcome.matrix.day_count()
                    );
                    0
                } else {
                    for d in &outcome.deficiencies {
                        eprintln!(
                            "{} {}/{}: {} of {}",
                            d.date, d.unit, d.shift, d.assigned, d.required
                        );
                    }
                    eprintln!("Found {} coverage deficiency(ies)", outcome.deficiencies.len());
                    // Code 2 = WARNING/INCOMPLETE
                    2
                }
            }
        }
        Commands::Validate {
            roster,
            staff,
            leave,
            config,
            holidays,
        } => {
            let mut outcome = JsonStorage::open(&roster)?.load()?;
            let staff = io::import_staff_csv(staff)?;
            let config = read_config(config.as_deref())?;
            let Some(&start) = outcome.matrix.dates.first() else {
                bail!("roster {roster} has no days");
            };
            let horizon = Horizon::new(start, outcome.matrix.day_count())?
                .with_holidays(parse_dates(&holidays)?);
            let leave = match leave {
                Some(path) => leave_for_horizon(&horizon, &io::import_leave_csv(path)?),
                None => Vec::new(),
            };

            match validate_roster(
                &outcome.matrix,
                &staff,
                &leave,
                &horizon,
                &config,
                &outcome.deficiencies,
            ) {
                Ok(()) => {
                    println!("OK: no violations");
                    0
                }
                Err(violations) => {
                    outcome.violations = violations;
                    report_violations(&outcome);
                    eprintln!("Found {} violation(s)", outcome.violations.len());
                    2
                }
            }
        }
        Commands::Staff { staff } => {
            let mut staff: Vec<Staff> = io::import_staff_csv(staff)?;
            staff.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.id.cmp(&b.id)));
            for s in &staff {
                let units: Vec<&str> = s.units.iter().map(|u| u.code()).collect();
                println!(
                    "{} | {} | {} | {} | nights: {}",
                    s.id,
                    s.name,
                    s.category,
                    units.join(";"),
                    if s.can_work_nights() { "yes" } else { "no" }
                );
            }
            0
        }
    };

    std::process::exit(code);
}

fn read_config(path: Option<&str>) -> Result<RosterConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(RosterConfig::default()),
    }
}

fn parse_dates(raw: &[String]) -> Result<Vec<NaiveDate>> {
    raw.iter().map(|s| io::parse_date(s)).collect()
}

fn report_violations(outcome: &RosterOutcome) {
    for v in &outcome.violations {
        let who = v.staff.as_ref().map_or("-", |s| s.as_str());
        eprintln!("{:?} {} {}: {}", v.invariant, v.date, who, v.observed);
    }
}
