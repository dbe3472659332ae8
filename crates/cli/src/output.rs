//! Terminal rendering of console state

use colored::{ColoredString, Colorize};
use dialer_core::{Campaign, Contact, ContactList, DialerPhase, DialerSnapshot, RecordId};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct CampaignRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Campaign")]
    name: String,
    #[tabled(rename = "Ends")]
    ends: String,
}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "List")]
    name: String,
    #[tabled(rename = "Contacts")]
    contacts: String,
}

#[derive(Tabled)]
struct ContactRow {
    #[tabled(rename = "ID")]
    id: RecordId,
    #[tabled(rename = "Contact")]
    name: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "State")]
    state: String,
}

fn marker(selected: bool) -> &'static str {
    if selected { "*" } else { "" }
}

pub fn campaigns_table(campaigns: &[Campaign], selected: Option<RecordId>) -> String {
    let rows = campaigns.iter().map(|campaign| CampaignRow {
        marker: marker(Some(campaign.id) == selected),
        id: campaign.id,
        name: campaign.display_name(),
        ends: campaign
            .end_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string()),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn lists_table(lists: &[ContactList], selected: Option<RecordId>) -> String {
    let rows = lists.iter().map(|list| ListRow {
        marker: marker(Some(list.id) == selected),
        id: list.id,
        name: list.display_name(),
        contacts: list
            .contact_count
            .map(|count| count.to_string())
            .unwrap_or_else(|| "?".to_string()),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

fn contact_state(contact: &Contact, snapshot: &DialerSnapshot) -> ColoredString {
    let is_current = snapshot.current_contact.as_ref().is_some_and(|c| c.id == contact.id);
    match contact.phone_number() {
        None => "no phone".dimmed(),
        Some(_) if contact.is_blacklisted() => "blacklisted".red(),
        Some(number) if snapshot.called.contains(number) => "called".green(),
        Some(_) if is_current => "next".yellow().bold(),
        Some(_) => "queued".normal(),
    }
}

pub fn contacts_table(snapshot: &DialerSnapshot) -> String {
    let rows = snapshot.contacts.iter().map(|contact| ContactRow {
        id: contact.id,
        name: contact.display_name(),
        phone: contact.phone_number().unwrap_or("-").to_string(),
        state: contact_state(contact, snapshot).to_string(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn phase_label(phase: DialerPhase) -> ColoredString {
    match phase {
        DialerPhase::Idle => "idle".normal(),
        DialerPhase::Dialing => "dialing".yellow(),
        DialerPhase::PacingDelay => "pacing".cyan(),
        DialerPhase::Stopped => "stopped".red(),
    }
}

/// One-line summary of the selection and queue
pub fn selection_summary(snapshot: &DialerSnapshot) -> String {
    let campaign = snapshot
        .selected_campaign
        .as_ref()
        .map(Campaign::display_name)
        .unwrap_or_else(|| "no campaign".to_string());
    let list = snapshot
        .selected_list
        .as_ref()
        .map(ContactList::display_name)
        .unwrap_or_else(|| "no list".to_string());
    format!(
        "{} / {}: {} to call, {} called [{}]",
        campaign.bold(),
        list.bold(),
        snapshot.remaining(),
        snapshot.called.len(),
        phase_label(snapshot.phase)
    )
}
