use clap::{Parser, Subcommand};
use ward_core::{
    config, BedId, BedStatus, CoreConfig, Patient, PatientId, PreemptionEvent, Priority,
    WardService,
};

#[derive(Parser)]
#[command(name = "ward")]
#[command(about = "Ward bed allocation and queueing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a patient to the queue and run an allocation pass
    Admit {
        /// Patient name
        name: String,
        /// Age in years
        age: u32,
        /// Triage priority (Emergency, Medium or Low)
        priority: Priority,
        /// Free-text medical history (optional)
        #[arg(long, default_value = "")]
        history: String,
    },
    /// Run an allocation pass over the current queue
    Allocate,
    /// Discharge an admitted patient
    Discharge {
        /// Patient id
        patient_id: u32,
    },
    /// Override a bed's status directly
    SetBed {
        /// Bed id
        bed_id: u32,
        /// New status (Available or Occupied)
        status: BedStatus,
    },
    /// List waiting patients
    Queue,
    /// List admitted patients
    Admitted,
    /// Show the bed pool
    Beds,
    /// Show ward statistics and today's summary
    Stats,
    /// Reset all ward data (demo only)
    Reset {
        /// Number of beds in the rebuilt pool
        #[arg(long)]
        beds: Option<u32>,
    },
}

fn service_from_env() -> Result<WardService, Box<dyn std::error::Error>> {
    let data_dir = config::ward_data_dir_from_env_value(std::env::var("WARD_DATA_DIR").ok());
    let bed_count = config::bed_count_from_env_value(std::env::var("WARD_BEDS").ok())?;
    let core_config = CoreConfig::new(data_dir, bed_count)?;
    Ok(WardService::open(&core_config)?)
}

fn print_events(events: &[PreemptionEvent]) {
    for event in events {
        println!(
            "Bumped patient {} ({}, {}) for emergency admission; freed {}.",
            event.patient, event.name, event.priority, event.freed_bed
        );
    }
}

fn print_patients(patients: &[Patient]) {
    if patients.is_empty() {
        println!("No patients.");
        return;
    }
    for patient in patients {
        let bed = patient
            .bed
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{}: {} (age {}, {}, {}, bed: {})",
            patient.id, patient.name, patient.age, patient.priority, patient.status, bed
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Admit {
            name,
            age,
            priority,
            history,
        }) => {
            let service = service_from_env()?;
            match service.submit_request(&name, age, history, priority) {
                Ok(id) => {
                    println!("Patient {} added to queue as {}.", name, id);
                    let events = service.run_allocation_pass()?;
                    print_events(&events);
                    if let Some(patient) = service.patient(id) {
                        if let Some(bed) = patient.bed {
                            println!("{} admitted to {}.", id, bed);
                        } else {
                            println!("{} is waiting for a bed.", id);
                        }
                    }
                }
                Err(e) => eprintln!("Error admitting patient: {}", e),
            }
        }
        Some(Commands::Allocate) => {
            let service = service_from_env()?;
            let events = service.run_allocation_pass()?;
            print_events(&events);
            let summary = service.pool_summary();
            println!(
                "Allocation pass complete: {} available, {} occupied.",
                summary.available, summary.occupied
            );
        }
        Some(Commands::Discharge { patient_id }) => {
            let service = service_from_env()?;
            match service.discharge(PatientId(patient_id)) {
                Ok(bed) => {
                    println!("Patient P{} discharged from {}.", patient_id, bed);
                    let events = service.run_allocation_pass()?;
                    print_events(&events);
                }
                Err(e) => eprintln!("Error discharging patient: {}", e),
            }
        }
        Some(Commands::SetBed { bed_id, status }) => {
            let service = service_from_env()?;
            match service.set_bed_status(BedId(bed_id), status) {
                Ok(displaced) => {
                    println!("Bed {} status updated to {}.", bed_id, status);
                    if let Some(patient) = displaced {
                        println!("Patient {} discharged by the override.", patient);
                    }
                    if status == BedStatus::Available {
                        let events = service.run_allocation_pass()?;
                        print_events(&events);
                    }
                }
                Err(e) => eprintln!("Error updating bed status: {}", e),
            }
        }
        Some(Commands::Queue) => {
            let service = service_from_env()?;
            print_patients(&service.list_waiting());
        }
        Some(Commands::Admitted) => {
            let service = service_from_env()?;
            print_patients(&service.list_admitted());
        }
        Some(Commands::Beds) => {
            let service = service_from_env()?;
            for bed in service.beds() {
                println!("{}: {}", bed.id, bed.status);
            }
            let summary = service.pool_summary();
            println!(
                "{} available, {} occupied.",
                summary.available, summary.occupied
            );
        }
        Some(Commands::Stats) => {
            let service = service_from_env()?;
            let stats = service.stats();
            println!(
                "Total: {}, Waiting: {}, Admitted: {}, Discharged: {}",
                stats.total, stats.waiting, stats.admitted, stats.discharged
            );
            let today = chrono::Utc::now().date_naive();
            let daily = service.daily_summary(today);
            println!(
                "Admitted on {}: {} ({} still admitted, {} discharged)",
                daily.date, daily.total, daily.admitted, daily.discharged
            );
            let distribution = service.age_distribution();
            if !distribution.is_empty() {
                println!("Age distribution:");
                for (age, count) in distribution {
                    println!("  {}: {}", age, count);
                }
            }
        }
        Some(Commands::Reset { beds }) => {
            let service = service_from_env()?;
            let bed_count = match beds {
                Some(n) => n,
                None => config::bed_count_from_env_value(std::env::var("WARD_BEDS").ok())?,
            };
            service.reset(bed_count)?;
            println!("Ward data reset with {} beds.", bed_count);
        }
        None => {
            println!("Use 'ward --help' for commands");
        }
    }

    Ok(())
}
