use anyhow::{bail, Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use neocare_common::{
    AnalysisResult, ChatMessage, ExtractionRules, Extractor, Recipient, Sender, StoreCandidate, UploadStatus,
};
use neocare_rust::analyzer::{self, AnalysisOutcome, PrescriptionScan, Report};
use neocare_rust::chat::{self, ChatAssistant};
use neocare_rust::cli::{Cli, Commands};
use neocare_rust::composer::OrderComposer;
use neocare_rust::config::Config;
use neocare_rust::error::NeoCareError;
use neocare_rust::gateway::AnalysisGateway;
use neocare_rust::scanner::{self, FileRef};
use neocare_rust::session::{preview, HistoryLog, UploadId, UploadSession};
use neocare_rust::store::{self, keys, FileStore, KeyValueStore, StoreExt};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    neocare_rust::init_logging(cli.verbose);

    let mut config = Config::load().context("failed to load config")?;
    let data_dir = config.data_dir()?;
    let store: Arc<dyn KeyValueStore> =
        Arc::new(FileStore::open(&data_dir).with_context(|| format!("cannot open {}", data_dir.display()))?);

    match cli.command {
        Commands::Analyze { paths, prompt, lang, recursive } => {
            println!("🩺 neocare - vitals analysis\n");

            let images = scanner::collect_images(&paths, recursive)?;
            if images.is_empty() {
                return Err(NeoCareError::NoImagesFound(format!("{:?}", paths)).into());
            }
            let files = scanner::load_files(&images)?;
            println!("✔ {} image(s) queued\n", files.len());

            store.delete(keys::PULSE_REPORT)?;
            let gateway = AnalysisGateway::from_config(&config)?;
            let history = HistoryLog::new(Arc::clone(&store), config.user_id.as_deref(), config.history_cap);
            let session = Arc::new(UploadSession::new(history, Duration::from_millis(config.tick_interval_ms)));

            let items = session.add_files(files);
            let ids: Vec<_> = items.iter().map(|item| item.id).collect();

            let bars = MultiProgress::new();
            let style = ProgressStyle::with_template("{prefix:>24} [{bar:30}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            let progress: Vec<_> = items
                .iter()
                .map(|item| {
                    let bar = bars.add(ProgressBar::new(100));
                    bar.set_style(style.clone());
                    bar.set_prefix(item.file.name.clone());
                    (item.id, bar)
                })
                .collect();

            let watcher = {
                let session = Arc::clone(&session);
                let progress = progress.clone();
                tokio::spawn(async move {
                    loop {
                        draw_progress(&session, &progress);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                })
            };

            let outcome = analyzer::analyze_queued(&session, &gateway, &ids, prompt.as_deref()).await;
            watcher.abort();
            draw_progress(&session, &progress);
            for (_, bar) in &progress {
                bar.finish();
            }
            println!();

            match outcome? {
                AnalysisOutcome::Completed(result) => {
                    let extractor = load_extractor(&config)?;
                    let lang = lang.unwrap_or(config.default_language);
                    let report = Report::build(&result, &extractor, lang, &gateway).await;
                    store.set_as(keys::PULSE_REPORT, &report)?;
                    print_report(&report);
                }
                other => {
                    let message = other.failure_message().unwrap_or_default();
                    bail!("analysis failed: {}", message);
                }
            }
        }

        Commands::Report { lang, input } => {
            let source: AnalysisResult = match input {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)
                        .with_context(|| format!("cannot read {}", path.display()))?;
                    serde_json::from_str(&content)?
                }
                None => store.require::<Report>(keys::PULSE_REPORT)?.source,
            };

            let extractor = load_extractor(&config)?;
            let gateway = AnalysisGateway::from_config(&config)?;
            let lang = lang.unwrap_or(config.default_language);
            let report = Report::build(&source, &extractor, lang, &gateway).await;
            store.set_as(keys::PULSE_REPORT, &report)?;
            print_report(&report);
        }

        Commands::Scan { image } => {
            println!("💊 neocare - prescription scan\n");

            // a new scan restarts the delivery flow
            for key in [keys::PHARMA_SCAN_RESULT, keys::PHARMAFAST_ORDER, keys::PHARMAFAST_REQUEST, keys::PHARMAFAST_RESPONSE] {
                store.delete(key)?;
            }
            let file = FileRef::from_path(&image)?;
            let gateway = AnalysisGateway::from_config(&config)?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_message(format!("reading {}", file.name));
            spinner.enable_steady_tick(Duration::from_millis(120));
            let scan = analyzer::scan_prescription(&gateway, &file).await;
            spinner.finish_and_clear();
            let scan = scan?;

            if !scan.result.is_success() {
                bail!("scan failed: {}", scan.result.error_message.clone().unwrap_or_default());
            }
            store.set_as(keys::PHARMA_SCAN_RESULT, &scan)?;
            print_scan(&scan);

            if scan.medicines.is_empty() {
                println!("\nNo medicines recognized; try a sharper photo.");
            } else {
                let composer = OrderComposer::from_medicines(&scan.medicines, Some(preview::snapshot(&file)));
                store.set_as(keys::PHARMAFAST_ORDER, &composer)?;
                println!("\n✔ Order draft saved. Next: `neocare order --name ... --phone ... --address ... --pincode ...`");
            }
        }

        Commands::Order { name, phone, address, pincode, landmark, lat, lon, quantities, removals, yes } => {
            println!("🚚 neocare - delivery request\n");

            let mut composer: OrderComposer = store.require(keys::PHARMAFAST_ORDER)?;
            for id in removals {
                composer.remove_line_item(id)?;
            }
            for change in quantities {
                composer.set_quantity(change.id, change.delta)?;
            }
            composer.set_recipient(Recipient {
                name,
                phone,
                address,
                pincode,
                landmark,
                latitude: lat,
                longitude: lon,
            })?;

            let report = match composer.validate() {
                Ok(report) => report,
                Err(NeoCareError::Validation(report)) => {
                    store.set_as(keys::PHARMAFAST_ORDER, &composer)?;
                    for error in &report.errors {
                        println!("  ✖ {}: {}", error.field, error.message);
                    }
                    bail!("request is not valid");
                }
                Err(e) => return Err(e.into()),
            };

            print_items(&composer);
            for warning in &report.warnings {
                println!("⚠ {}", warning);
            }
            if !report.warnings.is_empty() {
                let proceed = yes
                    || Confirm::new()
                        .with_prompt("Send the request without a location?")
                        .default(false)
                        .interact()?;
                if !proceed {
                    store.set_as(keys::PHARMAFAST_ORDER, &composer)?;
                    println!("Cancelled.");
                    return Ok(());
                }
                composer.confirm_missing_location();
            }

            let gateway = AnalysisGateway::from_config(&config)?;
            let submitted = composer.submit(&gateway).await.map(|result| result.clone());
            store.set_as(keys::PHARMAFAST_ORDER, &composer)?;
            let result = submitted?;

            store.set_as(keys::PHARMAFAST_REQUEST, composer.request())?;
            store.set_as(keys::PHARMAFAST_RESPONSE, &result)?;

            println!("\n✅ Request sent{}", result.request_id.as_deref().map(|id| format!(" ({})", id)).unwrap_or_default());
            print_stores(&result.stores);
            if let Some(url) = &result.map_url {
                println!("\nMap: {}", url);
            }
        }

        Commands::Stores { lat, lon, radius } => {
            let gateway = AnalysisGateway::from_config(&config)?;
            let radius = radius.unwrap_or(config.search_radius_km);
            let stores = gateway.nearby_stores(lat, lon, radius).await?;
            println!("{} store(s) within {} km", stores.len(), radius);
            print_stores(&stores);
        }

        Commands::Chat { message, clear } => {
            let gateway = AnalysisGateway::from_config(&config)?;
            let assistant = ChatAssistant::new(&gateway, Arc::clone(&store), config.user_id.as_deref());

            let mut conversation = if clear {
                let fresh = assistant.clear().await?;
                println!("✔ Conversation cleared\n");
                fresh
            } else {
                assistant.load().await?
            };

            match message {
                Some(text) => {
                    println!("{:>7}: {}", "You", text.trim());
                    let spinner = ProgressBar::new_spinner();
                    spinner.set_message("Dr.NEO is thinking");
                    spinner.enable_steady_tick(Duration::from_millis(120));
                    let reply = assistant.send(&mut conversation, &text).await;
                    spinner.finish_and_clear();
                    print_chat_line(&reply?);
                }
                None if !clear => {
                    for line in conversation.messages() {
                        print_chat_line(line);
                    }
                }
                None => {}
            }
        }

        Commands::History { remove, clear } => {
            let history = HistoryLog::new(Arc::clone(&store), config.user_id.as_deref(), config.history_cap);

            if clear {
                history.clear()?;
                println!("✔ History cleared");
                return Ok(());
            }
            if let Some(position) = remove {
                match position.checked_sub(1).map(|i| history.remove(i)).transpose()?.flatten() {
                    Some(entry) => println!("✔ Removed {}", entry.name),
                    None => println!("No entry at position {}", position),
                }
            }

            let entries = history.entries()?;
            if entries.is_empty() {
                println!("No uploads yet.");
            }
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "{:>3}. {}  {}  {} bytes  {}",
                    i + 1,
                    entry.added_at.format("%Y-%m-%d %H:%M"),
                    entry.name,
                    entry.size_bytes,
                    entry.mime_type
                );
            }
        }

        Commands::Config { set_api_url, show } => {
            if let Some(url) = set_api_url {
                config.set_api_url(&url)?;
                println!("✔ Service host set to {}", url);
            }

            if show {
                println!("Settings:");
                println!("  analysis:   {}", config.api_base_url);
                println!("  pharma:     {}", config.pharma_base_url);
                println!("  pharmafast: {}", config.pharmafast_base_url);
                println!("  chat:       {}", config.chat_base_url);
                println!("  language:   {}", config.default_language.label());
                println!("  user:       {}", config.user_id.as_deref().unwrap_or("guest"));
                println!("  token:      {}", if config.auth_token.is_some() { "set" } else { "not set" });
                println!("  data dir:   {}", data_dir.display());
            }
        }

        Commands::Login { user, token } => {
            config.login(user, token)?;
            chat::discard_guest_draft(store.as_ref())?;
            println!("✔ Logged in");
        }

        Commands::Logout => {
            config.logout()?;
            let cleared = store::clear_session_scope(store.as_ref())?;
            println!("✔ Logged out ({} saved item(s) cleared)", cleared);
        }
    }

    Ok(())
}

fn load_extractor(config: &Config) -> Result<Extractor> {
    let rules = match &config.rules_file {
        Some(path) => ExtractionRules::from_file(path)
            .with_context(|| format!("cannot load extraction rules from {}", path.display()))?,
        None => return Ok(Extractor::default()),
    };
    Ok(Extractor::new(&rules)?)
}

fn draw_progress(session: &UploadSession, bars: &[(UploadId, ProgressBar)]) {
    for (id, bar) in bars {
        if let Some(item) = session.get(*id) {
            bar.set_position(u64::from(item.progress));
            let message = match item.status {
                UploadStatus::Done => "done".to_string(),
                UploadStatus::Error => "failed".to_string(),
                status => status.to_string(),
            };
            bar.set_message(message);
        }
    }
}

fn print_chat_line(message: &ChatMessage) {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Bot => "Dr.NEO",
    };
    println!("{:>7}: {}", who, message.text);
}

fn print_list(title: &str, items: &[String]) {
    println!("\n{}:", title);
    if items.is_empty() {
        println!("  (not detected)");
    }
    for item in items {
        println!("  • {}", item);
    }
}

fn print_report(report: &Report) {
    println!("📋 Report ({})", report.language.label());
    if !report.summary().is_empty() {
        println!("\n{}", report.summary());
    }
    print_list("Possible conditions", &report.diseases());
    print_list("Medicines", &report.medicines());
    print_list("Symptoms", &report.symptoms());
    print_list("Precautions", &report.precautions());
}

fn print_scan(scan: &PrescriptionScan) {
    println!("{:<4} {:<32} {:<10} {:>10}", "#", "Medicine", "Form", "Price");
    for (i, medicine) in scan.medicines.iter().enumerate() {
        let price = medicine
            .unit_price
            .map(|p| format!("₹{:.2}", p))
            .unwrap_or_else(|| "on request".to_string());
        let mark = if medicine.is_highlighted() { " *" } else { "" };
        println!(
            "{:<4} {:<32} {:<10} {:>10}{}",
            i + 1,
            medicine.name,
            medicine.dosage_form.as_deref().unwrap_or("-"),
            price,
            mark
        );
    }
    println!("\nEstimated total: ₹{:.2}", scan.estimated_total);
}

fn print_items(composer: &OrderComposer) {
    for item in composer.items() {
        println!(
            "  [{}] {} x{}  ₹{:.2}",
            item.id,
            item.name,
            item.quantity,
            item.subtotal()
        );
    }
    println!("  Total: ₹{:.2}\n", composer.total());
}

fn print_stores(stores: &[StoreCandidate]) {
    for store in stores {
        println!(
            "  • {} ({:.1} km) {}  [{}]{}",
            store.name,
            store.distance,
            store.address,
            store.status,
            store.estimated_time.as_deref().map(|t| format!("  ETA {}", t)).unwrap_or_default()
        );
    }
}
