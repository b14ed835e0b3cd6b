//! Implements InputPort. Inquire-based interactive menu.
//!
//! Each menu entry calls one use case and prints its result as a plain-text table.

use crate::adapters::ui::banner::MINT;
use crate::adapters::ui::progress;
use crate::domain::{
    BankingPatterns, DomainError, Segment, SegmentCatalog, SegmentationAnalytics,
};
use crate::ports::{CustomerPage, InputPort};
use crate::usecases::{
    AnalyticsService, ProfileService, SegmentationProfile, SegmentationService,
    SegmentationSummary, TransferService,
};
use async_trait::async_trait;
use chrono::Utc;
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::{CustomType, Select, Text};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

const PAGE_SIZE: usize = 10;
const DEFAULT_EXPORT_PATH: &str = "./data/customers_export.csv";

/// Applies the global inquire theme.
pub fn apply_theme() {
    let accent = Color::rgb(MINT.0, MINT.1, MINT.2);
    let mut config = RenderConfig::default_colored();
    config.prompt_prefix = Styled::new("?").with_fg(accent);
    config.highlighted_option_prefix = Styled::new(">").with_fg(accent);
    config.selected_option = Some(StyleSheet::new().with_fg(accent));
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    RunSegmentation,
    SegmentationAnalytics,
    BankingPatterns,
    CustomerProfile,
    AssignSegment,
    ListCustomers,
    ImportCsv,
    ExportCsv,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 9] = [
        MenuItem::RunSegmentation,
        MenuItem::SegmentationAnalytics,
        MenuItem::BankingPatterns,
        MenuItem::CustomerProfile,
        MenuItem::AssignSegment,
        MenuItem::ListCustomers,
        MenuItem::ImportCsv,
        MenuItem::ExportCsv,
        MenuItem::Quit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuItem::RunSegmentation => "Run segmentation",
            MenuItem::SegmentationAnalytics => "Segmentation analytics",
            MenuItem::BankingPatterns => "Banking patterns",
            MenuItem::CustomerProfile => "Customer profile",
            MenuItem::AssignSegment => "Assign segment",
            MenuItem::ListCustomers => "List customers",
            MenuItem::ImportCsv => "Import CSV",
            MenuItem::ExportCsv => "Export CSV",
            MenuItem::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Segment choice in prompts. `None` means "all" or "not segmented" depending on the prompt.
#[derive(Debug, Clone, Copy)]
struct SegmentChoice(Option<Segment>, &'static str);

impl fmt::Display for SegmentChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(seg) => f.write_str(SegmentCatalog::profile(seg).name),
            None => f.write_str(self.1),
        }
    }
}

fn segment_choices(none_label: Option<&'static str>) -> Vec<SegmentChoice> {
    let mut choices: Vec<SegmentChoice> = none_label
        .map(|label| SegmentChoice(None, label))
        .into_iter()
        .collect();
    choices.extend(Segment::ALL.iter().map(|s| SegmentChoice(Some(*s), "")));
    choices
}

fn is_cancel(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

fn ui_err(e: InquireError) -> DomainError {
    DomainError::Ui(e.to_string())
}

/// Prompt result with Esc/Ctrl-C mapped to `None` (back to the menu).
fn prompted<T>(result: Result<T, InquireError>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_cancel(&e) => Ok(None),
        Err(e) => Err(ui_err(e)),
    }
}

fn segment_label(segment: Option<Segment>) -> &'static str {
    SegmentCatalog::display_name(segment)
}

pub fn render_summary(summary: &SegmentationSummary) -> String {
    let mut out = format!(
        "Evaluated {} customers: {} changed, {} applied, {} skipped\n",
        summary.total,
        summary.changed(),
        summary.applied,
        summary.outcome.skipped.len()
    );
    for change in &summary.outcome.changes {
        out.push_str(&format!(
            "  {:<16} {:<26} -> {:<26} risk {} -> {}\n",
            change.id,
            segment_label(change.old_segment),
            segment_label(Some(change.new_segment)),
            change.old_risk,
            change.new_risk
        ));
    }
    for skipped in &summary.outcome.skipped {
        out.push_str(&format!("  skipped {}: {}\n", skipped.id, skipped.reason));
    }
    out
}

pub fn render_segmentation(analytics: &SegmentationAnalytics) -> String {
    let mut out = format!(
        "{:<26} {:>7} {:>14} {:>14}\n",
        "Segment", "Count", "Avg balance", "Avg income"
    );
    for row in &analytics.segment_counts {
        out.push_str(&format!(
            "{:<26} {:>7} {:>14.2} {:>14.2}\n",
            segment_label(row.segment),
            row.count,
            row.avg_balance,
            row.avg_income
        ));
    }
    out.push_str(&format!("\n{:<10} {:>7}\n", "Risk", "Count"));
    for row in &analytics.risk_profile_counts {
        out.push_str(&format!("{:<10} {:>7}\n", row.risk_profile.as_str(), row.count));
    }
    out.push_str(&format!("\n{:<8} {:<26} {:>7}\n", "Month", "Segment", "New"));
    for row in &analytics.segment_growth {
        out.push_str(&format!(
            "{:04}-{:02}  {:<26} {:>7}\n",
            row.year,
            row.month,
            segment_label(row.segment),
            row.count
        ));
    }
    out
}

pub fn render_banking(patterns: &BankingPatterns) -> String {
    let mut out = format!(
        "{:<26} {:>7} {:>12} {:>12} {:>12}\n",
        "Segment", "Count", "Avg txn", "Max txn", "Min txn"
    );
    for row in &patterns.transaction_patterns {
        out.push_str(&format!(
            "{:<26} {:>7} {:>12.2} {:>12.2} {:>12.2}\n",
            segment_label(row.segment),
            row.count,
            row.avg_transaction_amount,
            row.max_transaction_amount,
            row.min_transaction_amount
        ));
    }
    out.push_str(&format!("\n{:<14} {:>7} {:>14}\n", "Account type", "Count", "Avg balance"));
    for row in &patterns.account_type_distribution {
        out.push_str(&format!(
            "{:<14} {:>7} {:>14.2}\n",
            row.account_type.as_str(),
            row.count,
            row.avg_balance
        ));
    }
    out.push_str(&format!("\n{:<14} {:>7} {:>14}\n", "Employment", "Count", "Avg income"));
    for row in &patterns.employment_distribution {
        out.push_str(&format!(
            "{:<14} {:>7} {:>14.2}\n",
            row.employment_status.as_str(),
            row.count,
            row.avg_income
        ));
    }
    out
}

pub fn render_profile(profile: &SegmentationProfile) -> String {
    let health = &profile.financial_health;
    let mut out = format!(
        "{} ({})\nSegment: {}\n  {}\nRisk profile: {}\nFinancial health: {} ({})\n",
        profile.name,
        profile.customer_id,
        profile.segment.name,
        profile.segment.description,
        profile.risk_profile,
        health.score,
        health.rating
    );
    out.push_str(&format!(
        "  income: {}, savings: {}, debt: {}, activity: {}\n",
        health.factors.income, health.factors.savings, health.factors.debt, health.factors.activity
    ));
    for c in &profile.segment.characteristics {
        out.push_str(&format!("  - {}\n", c));
    }
    if !profile.segment.recommendations.is_empty() {
        out.push_str("Recommendations:\n");
        for r in &profile.segment.recommendations {
            out.push_str(&format!("  * {}\n", r));
        }
    }
    out.push_str(&format!(
        "Last updated: {}\n",
        profile.last_updated.format("%Y-%m-%d %H:%M UTC")
    ));
    out
}

pub fn render_page(page: &CustomerPage) -> String {
    let mut out = format!(
        "{:<16} {:<24} {:<26} {:<8} {:>12}\n",
        "ID", "Name", "Segment", "Risk", "Joined"
    );
    for c in &page.customers {
        out.push_str(&format!(
            "{:<16} {:<24} {:<26} {:<8} {:>12}\n",
            c.id,
            c.full_name(),
            segment_label(c.segment),
            c.risk_profile.as_str(),
            c.created_at.format("%Y-%m-%d").to_string()
        ));
    }
    out.push_str(&format!(
        "Page {}/{} ({} customers)\n",
        page.current_page,
        page.total_pages.max(1),
        page.total
    ));
    out
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    segmentation: Arc<SegmentationService>,
    analytics: Arc<AnalyticsService>,
    profiles: Arc<ProfileService>,
    transfer: Arc<TransferService>,
}

impl TuiInputPort {
    pub fn new(
        segmentation: Arc<SegmentationService>,
        analytics: Arc<AnalyticsService>,
        profiles: Arc<ProfileService>,
        transfer: Arc<TransferService>,
    ) -> Self {
        Self {
            segmentation,
            analytics,
            profiles,
            transfer,
        }
    }

    async fn handle(&self, item: MenuItem) -> Result<(), DomainError> {
        match item {
            MenuItem::RunSegmentation => {
                let spinner = progress::spinner("Classifying customers...");
                match self.segmentation.run_segmentation(Utc::now()).await {
                    Ok(summary) => {
                        progress::finish(&spinner, true, "Segmentation complete");
                        println!("{}", render_summary(&summary));
                    }
                    Err(e) => {
                        progress::finish(&spinner, false, "Segmentation failed");
                        return Err(e);
                    }
                }
            }
            MenuItem::SegmentationAnalytics => {
                let analytics = self.analytics.segmentation_analytics(Utc::now()).await?;
                println!("{}", render_segmentation(&analytics));
            }
            MenuItem::BankingPatterns => {
                let patterns = self.analytics.banking_patterns().await?;
                println!("{}", render_banking(&patterns));
            }
            MenuItem::CustomerProfile => {
                let Some(id) = prompted(Text::new("Customer ID:").prompt())? else {
                    return Ok(());
                };
                let profile = self.profiles.segmentation_profile(id.trim()).await?;
                println!("{}", render_profile(&profile));
            }
            MenuItem::AssignSegment => {
                let Some(id) = prompted(Text::new("Customer ID:").prompt())? else {
                    return Ok(());
                };
                let Some(choice) =
                    prompted(Select::new("New segment:", segment_choices(None)).prompt())?
                else {
                    return Ok(());
                };
                if let Some(segment) = choice.0 {
                    let change = self.segmentation.assign_segment(id.trim(), segment).await?;
                    println!(
                        "{}: {} -> {} (risk {})",
                        change.id,
                        segment_label(change.old_segment),
                        segment_label(Some(change.new_segment)),
                        change.new_risk
                    );
                }
            }
            MenuItem::ListCustomers => {
                let Some(filter) = prompted(
                    Select::new("Segment:", segment_choices(Some("All segments"))).prompt(),
                )?
                else {
                    return Ok(());
                };
                let Some(page) =
                    prompted(CustomType::<usize>::new("Page:").with_default(1).prompt())?
                else {
                    return Ok(());
                };
                let page = self.profiles.list_customers(filter.0, page, PAGE_SIZE).await?;
                println!("{}", render_page(&page));
            }
            MenuItem::ImportCsv => {
                let Some(path) = prompted(Text::new("CSV file to import:").prompt())? else {
                    return Ok(());
                };
                let spinner = progress::spinner(format!("Importing {}...", path));
                match self.transfer.import_csv(&PathBuf::from(path.trim())).await {
                    Ok(summary) => progress::finish(
                        &spinner,
                        true,
                        format!(
                            "Imported {} customers ({} rows rejected)",
                            summary.imported, summary.rejected
                        ),
                    ),
                    Err(e) => {
                        progress::finish(&spinner, false, "Import failed");
                        return Err(e);
                    }
                }
            }
            MenuItem::ExportCsv => {
                let Some(path) = prompted(
                    Text::new("Export to:")
                        .with_default(DEFAULT_EXPORT_PATH)
                        .prompt(),
                )?
                else {
                    return Ok(());
                };
                let Some(filter) = prompted(
                    Select::new("Segment:", segment_choices(Some("All segments"))).prompt(),
                )?
                else {
                    return Ok(());
                };
                let rows = self
                    .transfer
                    .export_csv(&PathBuf::from(path.trim()), filter.0)
                    .await?;
                println!("Exported {} customers to {}", rows, path.trim());
            }
            MenuItem::Quit => {}
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let menu = Select::new("What would you like to do?", MenuItem::ALL.to_vec())
                .with_page_size(MenuItem::ALL.len())
                .prompt();
            let item = match prompted(menu)? {
                Some(MenuItem::Quit) | None => return Ok(()),
                Some(item) => item,
            };
            // Action failures are reported and the menu continues.
            if let Err(e) = self.handle(item).await {
                error!(action = %item, error = %e, "action failed");
                println!("Error: {}", e);
            }
        }
    }
}
