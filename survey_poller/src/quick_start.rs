/*!

# Quick start with Google Forms

This walk-through shows a live survey dashboard for a meetup, using Google Forms to collect the answers.
Google Forms is free and stores every submission as a row of a Google Sheet. Other providers (Microsoft Forms,
Qualtrics) can export the same kind of table.

**Creating the form** Create a form in Google Drive with the questions you want to ask, for instance
`What is your experience level with data analytics?` (multiple choice), `What technologies are you most interested in?`
(checkboxes) and `How would you rate today's session?` (linear scale from 1 to 5). The exact wording of each question
matters: it becomes the column label in the response sheet and is how `formwatch` finds the answers.

**Linking the sheet** In the `Responses` tab of the form, use the `Link to Sheets` option. Google creates a spreadsheet with a
worksheet named `Form Responses 1`. Its first column is `Timestamp`, followed by one column per question. The spreadsheet
id is the long token in its URL: `https://docs.google.com/spreadsheets/d/{SPREADSHEET_ID}/edit`.

**Access** Either share the sheet as "anyone with the link can view" and create an API key in the Google Cloud console, or
obtain an OAuth access token for an account that can read the sheet (`gcloud auth print-access-token` works for a quick demo).

**Running the dashboard** Put the labels of the questions in a configuration file (see [`crate::manual`]) or pass them
on the command line:

```bash
export FORMWATCH_API_KEY=...
formwatch --spreadsheet-id 1f5epAPxP_Yd3g1TunEMdtianpVAhKS0RG6BKRDSLtrk \
  --field "experience=What is your experience level with data analytics?" \
  --field "technologies=What technologies are you most interested in?:multi" \
  --field "rating=How would you rate today's session?:rating" \
  --interval 30 --duration 60
```

Every 30 seconds for an hour, the sheet is fetched again. New submissions are logged as they arrive and the summary is
printed again whenever something changed:

```text
[2025-11-15T10:02:31Z INFO  survey_poller] Iteration 5: 2 new / 14 total responses (watermark 2025-11-15 10:02:12)
```

## Using the library directly

The same loop is available to any program. A source returns the full current set of responses, the consumer receives the new ones:

```
use std::time::Duration;
use survey_poller::builder::PollerBuilder;
use survey_poller::clock::ManualClock;
use survey_poller::*;

let header = vec!["Timestamp".to_string(), "Rating".to_string()];
let mut sheet: Vec<ResponseRecord> = vec![];
let mut arrivals = vec![
    vec!["11/15/2025 10:00:00", "4"],
    vec!["11/15/2025 10:00:40", "5"],
]
.into_iter();

let source = source_fn(move || {
    // One new row appears on every fetch.
    if let Some(row) = arrivals.next() {
        let row: Vec<String> = row.iter().map(|s| s.to_string()).collect();
        sheet.push(ResponseRecord::from_row(&header, &row));
    }
    Ok(sheet.clone())
});

let mut delivered: Vec<usize> = vec![];
let consumer = consumer_fn(|batch: &Batch<'_>| {
    delivered.push(batch.new_records.len());
    Ok(())
});

let rules = PollRules {
    interval: Duration::from_secs(30),
    duration: RunDuration::Bounded(Duration::from_secs(90)),
    ..PollRules::default()
};
let stats = PollerBuilder::new(&rules)?
    .clock(ManualClock::new())
    .build(source, consumer)
    .run();

assert_eq!(stats.iterations, 3);
assert_eq!(delivered, vec![1, 1, 0]);
# Ok::<(), PollErrors>(())
```

*/
