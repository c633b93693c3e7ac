use chrono::{Duration, Utc};
use strava_notion_client::{StravaClient, config::StravaConfig, strava::ReqwestStravaClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = StravaConfig::from_env()?;
    let client = ReqwestStravaClient::new(cfg)?;

    let days = std::env::var("DAYS_BACK")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(7);

    let until = Utc::now();
    let activities = client
        .list_activities(until - Duration::days(days), until)
        .await
        .map_err(|e| format!("failed to fetch activities: {}", e))?;

    if activities.is_empty() {
        println!("No activities in the last {} days (check credentials or scope)", days);
        return Ok(());
    }

    println!("Activities in the last {} days:", days);
    for a in activities {
        let name = a.name.as_deref().unwrap_or("(no name)");
        let sport = a.sport_label().unwrap_or("?");
        let date = a
            .local_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "????-??-??".into());
        println!("- {} {} [{}] {}", a.id, date, sport, name);
    }

    Ok(())
}
