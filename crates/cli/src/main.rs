//! Command line interface for the TransTrack waitlist store.
//!
//! Works directly on the on-disk records through the core services, bypassing the
//! REST API. Useful for seeding a deployment and for quick inspection. Writes made
//! here land in the same audit trail the API writes to, attributed to `cli`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use transtrack_core::{
    matching::MatchingService,
    model::{AuditAction, StaffRole, User},
    repositories, resolve_data_dir,
    scoring::{ScoringService, ScoringWeights, DEFAULT_WEIGHTS},
    CoreConfig,
};
use transtrack_types::{EntityId, NonEmptyText};

/// Actor recorded in the audit trail for command line runs.
const ACTOR: &str = "cli";

#[derive(Parser)]
#[command(name = "transtrack")]
#[command(about = "TransTrack transplant waitlist CLI")]
struct Cli {
    /// Records directory (defaults to TRANSTRACK_DATA_DIR, then ./transtrack_data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all waitlist patients
    ListPatients,
    /// Recompute one patient's priority score
    Score {
        /// Patient id (32 lowercase hex characters)
        patient_id: String,
        /// Use the legacy additive formula instead of the weighted engine
        #[arg(long)]
        legacy: bool,
    },
    /// Run donor matching for a registered organ
    MatchDonor {
        /// Donor organ id (32 lowercase hex characters)
        donor_organ_id: String,
    },
    /// Register a staff user
    AddUser {
        /// Login email, unique within the deployment
        email: String,
        /// Display name
        full_name: String,
        /// Staff role: admin, coordinator or clinician
        #[arg(long, default_value = "coordinator")]
        role: String,
    },
    /// Show the scoring weights currently in effect
    ShowWeights,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let data_dir = resolve_data_dir(
        cli.data_dir
            .or_else(|| std::env::var("TRANSTRACK_DATA_DIR").ok().map(PathBuf::from)),
    );
    let cfg = Arc::new(CoreConfig::new(data_dir));

    match cli.command {
        Some(Commands::ListPatients) => {
            let patients = repositories::patients::list_patients(&cfg);
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for record in patients {
                    let priority = match record.data.priority_score {
                        Some(score) => format!("{:.2}", score),
                        None => "unscored".to_string(),
                    };
                    println!(
                        "ID: {}, MRN: {}, Name: {}, Organ: {}, Priority: {}",
                        record.id,
                        record.data.medical_record_number,
                        record.data.full_name,
                        record.data.organ_needed,
                        priority
                    );
                }
            }
        }
        Some(Commands::Score { patient_id, legacy }) => {
            let id: EntityId = match patient_id.parse() {
                Ok(id) => id,
                Err(e) => {
                    eprintln!("Error reading patient id: {}", e);
                    return Ok(());
                }
            };
            let service = ScoringService::new(cfg);
            if legacy {
                match service.score_patient_legacy(&id, ACTOR) {
                    Ok((record, score)) => {
                        println!("Legacy priority for {}: {:.2}", record.data.full_name, score);
                    }
                    Err(e) => eprintln!("Error scoring patient: {}", e),
                }
            } else {
                match service.score_patient(&id, ACTOR) {
                    Ok((record, result)) => {
                        println!("Priority for {}: {:.2}", record.data.full_name, result.score);
                        println!(
                            "Strongest factors: {}",
                            result.breakdown.strongest_factors(3)
                        );
                    }
                    Err(e) => eprintln!("Error scoring patient: {}", e),
                }
            }
        }
        Some(Commands::MatchDonor { donor_organ_id }) => {
            let id: EntityId = match donor_organ_id.parse() {
                Ok(id) => id,
                Err(e) => {
                    eprintln!("Error reading donor organ id: {}", e);
                    return Ok(());
                }
            };
            let service = MatchingService::new(cfg);
            match service.match_donor(&id, ACTOR) {
                Ok(outcome) => {
                    println!(
                        "Matched {} {} from donor {} against {} compatible patients",
                        outcome.donor.data.blood_type,
                        outcome.donor.data.organ_type,
                        outcome.donor.data.donor_identifier,
                        outcome.total_compatible
                    );
                    if outcome.matches.is_empty() {
                        println!("No matches created.");
                    } else {
                        for organ_match in &outcome.matches {
                            println!(
                                "  #{} patient {} score {:.1}",
                                organ_match.data.priority_rank,
                                organ_match.data.patient_id,
                                organ_match.data.compatibility_score
                            );
                        }
                    }
                }
                Err(e) => eprintln!("Error matching donor organ: {}", e),
            }
        }
        Some(Commands::AddUser {
            email,
            full_name,
            role,
        }) => {
            let role: StaffRole = match role.parse() {
                Ok(role) => role,
                Err(e) => {
                    eprintln!("Error reading role: {}", e);
                    return Ok(());
                }
            };
            let user = match (NonEmptyText::new(&email), NonEmptyText::new(&full_name)) {
                (Ok(email), Ok(full_name)) => User {
                    email,
                    full_name,
                    role,
                },
                (Err(e), _) | (_, Err(e)) => {
                    eprintln!("Error reading user details: {}", e);
                    return Ok(());
                }
            };
            match repositories::users::create_user(&cfg, user) {
                Ok(record) => {
                    repositories::audit::record_action(
                        &cfg,
                        AuditAction::UserRegistered,
                        "user",
                        &record.id.to_string(),
                        format!("{} registered as {}", record.data.email, record.data.role),
                        ACTOR,
                    )?;
                    println!(
                        "Registered {} ({}) as {}",
                        record.data.full_name, record.data.email, record.data.role
                    );
                }
                Err(e) => eprintln!("Error registering user: {}", e),
            }
        }
        Some(Commands::ShowWeights) => match repositories::weights::active_config(&cfg) {
            Some(record) => {
                println!("Active configuration: {}", record.data.name);
                print_weights(&record.data.to_weights());
            }
            None => {
                println!("No stored configuration is active; using built-in defaults.");
                print_weights(&DEFAULT_WEIGHTS);
            }
        },
        None => {
            println!("Use 'transtrack --help' for commands");
        }
    }

    Ok(())
}

fn print_weights(weights: &ScoringWeights) {
    println!("  medical_urgency     {:>5.1}", weights.medical_urgency);
    println!("  time_on_waitlist    {:>5.1}", weights.time_on_waitlist);
    println!("  organ_specific      {:>5.1}", weights.organ_specific);
    println!("  evaluation_recency  {:>5.1}", weights.evaluation_recency);
    println!("  blood_type_rarity   {:>5.1}", weights.blood_type_rarity);
    println!("  evaluation_decay_rate {:.2}", weights.evaluation_decay_rate);
}
