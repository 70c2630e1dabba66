use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use parcelaw_core::{
    Intent, LotContext, Resolution, ResolveRequest, RuleTable, resolve_all, resolve_answer,
};
use parcelaw_data::{DefinitionSet, load_definitions};

mod display;

#[derive(Parser)]
#[command(name = "parcelaw", version, about = "Zoning answers with citations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one zoning question for a district.
    Answer {
        #[command(flatten)]
        parcel: ParcelArgs,
        /// Question to answer, e.g. front_setback.
        #[arg(long)]
        intent: Intent,
        /// Append the step-by-step explanation trace.
        #[arg(long)]
        trace: bool,
        /// Emit the resolution as JSON instead of a card.
        #[arg(long)]
        json: bool,
    },
    /// Resolve all six zoning questions for a district as a report.
    Report {
        #[command(flatten)]
        parcel: ParcelArgs,
    },
}

#[derive(Args)]
struct ParcelArgs {
    /// Zoning district, e.g. SF-3.
    #[arg(long)]
    zone: String,
    #[arg(long, default_value = "austin")]
    jurisdiction: String,
    /// Active overlay district IDs, e.g. --overlay HD --overlay NP.
    #[arg(long = "overlay")]
    overlays: Vec<String>,
    /// Assessor parcel number, enables parcel-scoped overrides.
    #[arg(long)]
    apn: Option<String>,
    /// Directory holding overlays.json / exceptions.json / overrides.json.
    #[arg(long, env = "PARCELAW_CONFIG", default_value = "config")]
    config: PathBuf,
    #[arg(long)]
    corner: bool,
    #[arg(long)]
    flag_lot: bool,
    /// Street frontage in feet.
    #[arg(long)]
    frontage: Option<f64>,
    /// Grade in percent.
    #[arg(long)]
    slope: Option<f64>,
}

impl ParcelArgs {
    fn lot_context(&self) -> LotContext {
        LotContext {
            corner: self.corner.then_some(true),
            flag: self.flag_lot.then_some(true),
            frontage: self.frontage,
            width: None,
            slope: self.slope,
        }
    }
}

fn resolve_one(
    table: &RuleTable,
    parcel: &ParcelArgs,
    defs: &DefinitionSet,
    context: &LotContext,
    intent: Intent,
) -> anyhow::Result<Resolution> {
    let request = ResolveRequest {
        district: &parcel.zone,
        intent,
        jurisdiction_id: &parcel.jurisdiction,
        active_overlays: &parcel.overlays,
        overlay_defs: &defs.overlays,
        exception_rules: &defs.exceptions,
        lot_context: Some(context),
        overrides: &defs.overrides,
        apn: parcel.apn.as_deref(),
        now: Utc::now(),
    };
    Ok(resolve_answer(table, &request)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::debug!("parcelaw v{}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();
    let table = RuleTable::builtin();

    match cli.command {
        Command::Answer {
            parcel,
            intent,
            trace,
            json,
        } => {
            let defs = load_definitions(&parcel.config).await?;
            let context = parcel.lot_context();
            let resolution = resolve_one(&table, &parcel, &defs, &context, intent)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resolution.answer)?);
                if let Some(t) = &resolution.trace {
                    println!("{}", serde_json::to_string_pretty(t)?);
                }
            } else {
                print!("{}", display::answer_card(&resolution));
                if trace {
                    if let Some(t) = &resolution.trace {
                        print!("\n{}", t.to_markdown());
                    }
                }
            }
        }
        Command::Report { parcel } => {
            let defs = load_definitions(&parcel.config).await?;
            let context = parcel.lot_context();
            let request = ResolveRequest {
                district: &parcel.zone,
                intent: Intent::FrontSetback,
                jurisdiction_id: &parcel.jurisdiction,
                active_overlays: &parcel.overlays,
                overlay_defs: &defs.overlays,
                exception_rules: &defs.exceptions,
                lot_context: Some(&context),
                overrides: &defs.overrides,
                apn: parcel.apn.as_deref(),
                now: Utc::now(),
            };
            let resolutions = resolve_all(&table, &request)?;
            print!(
                "{}",
                display::zone_report(&parcel.zone, &parcel.jurisdiction, &resolutions)
            );
        }
    }

    Ok(())
}
