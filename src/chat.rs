// Terminal front-end: collect preferences, show the plan, then answer
// follow-up questions until the user leaves.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::info;

use wayfarer::{HotelListing, Planner, PreferenceForm, SessionSnapshot, SubmitOutcome};

fn prompt_line(stdin: &mut impl BufRead, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub fn render_hotels(hotels: &[HotelListing]) -> String {
    let mut out = String::new();
    for (i, hotel) in hotels.iter().enumerate() {
        let price = hotel
            .price
            .map(|p| format!("${p:.0}/night"))
            .unwrap_or_else(|| "price n/a".to_string());
        let rating = hotel
            .rating
            .map(|r| format!("{r:.1}★"))
            .unwrap_or_else(|| "unrated".to_string());
        out.push_str(&format!("{:>2}. {} ({price}, {rating})", i + 1, hotel.name));
        if let Some(link) = &hotel.link {
            out.push_str(&format!("\n    {link}"));
        }
        out.push('\n');
    }
    out
}

pub fn print_plan(snapshot: &SessionSnapshot) {
    if let Some(itinerary) = &snapshot.itinerary {
        println!("\n{}\n", itinerary.raw_text);
    }
    match (&snapshot.hotels, &snapshot.hotel_warning) {
        (Some(hotels), _) if !hotels.is_empty() => {
            println!("Hotels:\n{}", render_hotels(hotels));
        }
        (_, Some(warning)) => println!("Hotels: {warning}\n"),
        _ => {}
    }
}

pub async fn run_chat(planner: &Planner) -> Result<()> {
    info!("Starting interactive planning session...");
    let stdin = io::stdin();
    let mut stdin = stdin.lock();

    // Ask for preferences until they validate and a plan comes back.
    loop {
        let mut form = PreferenceForm::default();
        let fields: [(&str, &mut String); 5] = [
            ("Destination: ", &mut form.destination),
            ("Start date (YYYY-MM-DD): ", &mut form.start_date),
            ("End date (YYYY-MM-DD): ", &mut form.end_date),
            ("Interests (comma separated): ", &mut form.interests),
            ("Budget (Budget/Moderate/Luxury or amount): ", &mut form.budget),
        ];
        for (label, slot) in fields {
            match prompt_line(&mut stdin, label)? {
                Some(value) => *slot = value,
                None => return Ok(()),
            }
        }

        let prefs = match form.validate() {
            Ok(prefs) => prefs,
            Err(err) => {
                println!("{}", err.user_message());
                continue;
            }
        };

        println!("Generating your personalized travel plan...");
        match planner.submit(prefs).await {
            Ok(SubmitOutcome::Stored(_)) | Ok(SubmitOutcome::Superseded) => {
                print_plan(&planner.snapshot());
                break;
            }
            Err(err) => println!("An error occurred while generating your plan: {}", err.user_message()),
        }
    }

    println!("Ask follow-up questions (/clear to clear history, /quit to exit).");
    while let Some(question) = prompt_line(&mut stdin, "You: ")? {
        match question.as_str() {
            "/quit" | "/exit" => break,
            "/clear" => {
                planner.clear_history();
                println!("Chat history cleared.");
            }
            _ => match planner.ask(&question).await {
                Ok(turn) => println!("Planner: {}\n", turn.answer),
                Err(err) => println!("{}", err.user_message()),
            },
        }
    }

    info!("Planning session finished.");
    Ok(())
}
