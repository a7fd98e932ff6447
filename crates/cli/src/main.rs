use std::path::PathBuf;
use std::sync::Arc;

use api_shared::convert::parse_patient_id;
use api_shared::{PatientReq, VisitReq};
use clap::{Parser, Subcommand};
use frontdesk_core::{
    asset_paths_from_env_values, constants::DEFAULT_DATA_DIR, constants::DEFAULT_PUBLIC_URL,
    font_file_from_env_value,
    CoreConfig, DischargeService, NewDischargeSummary, PatientService, VisitService,
};

#[derive(Parser)]
#[command(name = "frontdesk")]
#[command(about = "Hospital front desk records CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    List,
    /// Show the identifier the next registration will receive
    NextId,
    /// Register a patient
    AddPatient {
        name: String,
        age: u16,
        /// Male, Female or Other
        gender: String,
        contact_number: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        medical_history: Option<String>,
        /// Active, Follow-up or Chronic (default Active)
        #[arg(long)]
        status: Option<String>,
    },
    /// Search patients by name
    Search {
        /// Case-insensitive name fragment
        term: String,
    },
    /// Log a visit
    AddVisit {
        /// Patient identifier, e.g. PO00001
        patient_id: String,
        doctor_name: String,
        /// Visit date (YYYY-MM-DD)
        date: String,
        /// Follow-up, Regular or New
        checkup_type: String,
        /// OPD, IPD or Emergency
        healthcare_service: String,
        blood_pressure: String,
        /// Oxygen saturation percentage
        oxygen_level: String,
        /// Weight in kilograms
        weight: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show visits of one patient, or the recent visit history
    Visits {
        /// Patient identifier (optional)
        patient_id: Option<String>,
    },
    /// Create a discharge summary from a YAML file
    AddDischarge {
        /// Path to the YAML document
        file: PathBuf,
    },
    /// List discharge summaries
    Discharges,
    /// Render a discharge summary to a PDF file
    RenderPdf {
        /// Discharge summary key
        id: u64,
        /// Output path (default: discharge_summary_<id>.pdf)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn load_config() -> Result<Arc<CoreConfig>, Box<dyn std::error::Error>> {
    let data_dir =
        PathBuf::from(env_value("FRONTDESK_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
    let mut assets = asset_paths_from_env_values(
        env_value("FRONTDESK_BASE_DIR"),
        env_value("FRONTDESK_STATIC_URL"),
        env_value("FRONTDESK_STATIC_ROOT"),
        env_value("FRONTDESK_MEDIA_URL"),
        env_value("FRONTDESK_MEDIA_ROOT"),
    );
    assets.font_file = font_file_from_env_value(env_value("FRONTDESK_FONT_FILE"));
    let public_url =
        env_value("FRONTDESK_PUBLIC_URL").unwrap_or_else(|| DEFAULT_PUBLIC_URL.into());
    Ok(Arc::new(CoreConfig::new(data_dir, assets, &public_url)?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'frontdesk --help' for commands");
        return Ok(());
    };

    let cfg = load_config()?;
    let patients = PatientService::new(cfg.clone());
    let visits = VisitService::new(cfg.clone());
    let discharges = DischargeService::new(cfg);

    match command {
        Commands::List => {
            let records = patients.list()?;
            if records.is_empty() {
                println!("No patients found.");
            }
            for patient in records {
                println!(
                    "ID: {}, Name: {}, Age: {}, Status: {}, Created: {}",
                    patient.patient_id,
                    patient.name,
                    patient.age,
                    patient.status,
                    patient.created_at
                );
            }
        }
        Commands::NextId => {
            println!("{}", patients.next_patient_id()?);
        }
        Commands::AddPatient {
            name,
            age,
            gender,
            contact_number,
            email,
            address,
            medical_history,
            status,
        } => {
            let req = PatientReq {
                name,
                age,
                gender,
                contact_number,
                email,
                address,
                medical_history,
                status,
            };
            let record = patients.create(req.into_new_patient()?)?;
            println!("Registered patient {}", record.patient_id);
        }
        Commands::Search { term } => {
            for patient in patients.search(&term)? {
                println!("{}  {}", patient.patient_id, patient.search_label());
            }
        }
        Commands::AddVisit {
            patient_id,
            doctor_name,
            date,
            checkup_type,
            healthcare_service,
            blood_pressure,
            oxygen_level,
            weight,
            notes,
        } => {
            let req = VisitReq {
                patient_id,
                doctor_name,
                date,
                checkup_type,
                healthcare_service,
                blood_pressure,
                oxygen_level,
                weight,
                notes,
            };
            let record = visits.create(req.into_new_visit()?)?;
            println!(
                "Logged visit {} for patient {}",
                record.visit_number, record.patient_id
            );
        }
        Commands::Visits { patient_id: Some(raw) } => {
            let patient_id = parse_patient_id(&raw)?;
            for visit in visits.list_for_patient(&patient_id)? {
                println!(
                    "{}  {}  {} ({}, {})  BP {}  SpO2 {}%  {} kg",
                    visit.date,
                    visit.patient_id,
                    visit.doctor_name,
                    visit.checkup_type,
                    visit.healthcare_service,
                    visit.blood_pressure,
                    visit.oxygen_level.percent(),
                    visit.weight
                );
            }
        }
        Commands::Visits { patient_id: None } => {
            for entry in visits.recent_history()? {
                println!(
                    "{}  {} {}  {} ({})",
                    entry.visit.date,
                    entry.patient.patient_id,
                    entry.patient.name,
                    entry.visit.doctor_name,
                    entry.visit.checkup_type
                );
            }
        }
        Commands::AddDischarge { file } => {
            let yaml_text = std::fs::read_to_string(&file)?;
            let record = discharges.create(NewDischargeSummary::from_yaml(&yaml_text)?)?;
            println!(
                "Created discharge summary {} for patient {}",
                record.id, record.patient_id
            );
        }
        Commands::Discharges => {
            for summary in discharges.list()? {
                println!(
                    "{}  {}  {}  {} to {}  {}",
                    summary.id,
                    summary.patient_id,
                    summary.uhid,
                    summary.admission_date,
                    summary.discharge_date,
                    summary.discharge_type
                );
            }
        }
        Commands::RenderPdf { id, output } => {
            let document = discharges.render_pdf(id, None)?;
            let output = output.unwrap_or_else(|| PathBuf::from(&document.filename));
            std::fs::write(&output, &document.bytes)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}
