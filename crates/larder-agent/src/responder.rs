//! The inventory assistant behind the chatbot.
//!
//! One invocation makes at most two model calls and one search call:
//! the first reply is either a final answer or a request to search the web,
//! in which case the search result is fed back for a final answer.

use std::{collections::BTreeMap, fmt::Write as _, sync::{Arc, LazyLock}};

use chrono::NaiveDate;
use larder_core::{
  item::StockedItem,
  service::{ServiceError, TextGenerator, WebSearch},
  store::InventoryStore,
};
use larder_insights::InsightCache;
use regex::Regex;
use serde::Deserialize;

/// Name of the only tool the model may call.
pub const SEARCH_TOOL: &str = "search_the_web";

const EMPTY_INVENTORY: &str = "The inventory is currently empty.";

// ─── Reply parsing ───────────────────────────────────────────────────────────

/// A first-round model reply, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
  Answer(String),
  Search { query: String },
}

static TOOL_BLOCK: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)<tool_code>(.*?)</tool_code>").expect("valid regex"));

static SEARCH_CALL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r#"(?s)^search_the_web\(\s*(?:query\s*=\s*)?(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')\s*\)$"#,
  )
  .expect("valid regex")
});

#[derive(Deserialize)]
struct JsonToolCall {
  tool:  String,
  query: String,
}

fn unescape(literal: &str) -> String {
  let mut out = String::with_capacity(literal.len());
  let mut chars = literal.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    match chars.next() {
      Some('n') => out.push('\n'),
      Some('t') => out.push('\t'),
      Some(other) => out.push(other),
      None => out.push('\\'),
    }
  }
  out
}

/// Strip a surrounding markdown code fence, with or without a language tag.
fn strip_fence(s: &str) -> &str {
  let s = s.trim();
  let Some(inner) = s.strip_prefix("```").and_then(|r| r.strip_suffix("```")) else {
    return s;
  };
  match inner.split_once('\n') {
    Some((lang, rest)) if !lang.trim().contains(' ') => rest.trim(),
    _ => inner.trim(),
  }
}

fn parse_search_call(code: &str) -> Option<String> {
  let caps = SEARCH_CALL.captures(strip_fence(code))?;
  let literal = caps.get(1).or_else(|| caps.get(2))?.as_str();
  let query = unescape(literal).trim().to_owned();
  (!query.is_empty()).then_some(query)
}

fn parse_json_call(text: &str) -> Option<String> {
  let call: JsonToolCall = serde_json::from_str(strip_fence(text)).ok()?;
  let query = call.query.trim();
  (call.tool == SEARCH_TOOL && !query.is_empty()).then(|| query.to_owned())
}

impl ModelReply {
  /// Interpret `text` as a single search request, either
  /// `<tool_code>search_the_web("...")</tool_code>` or
  /// `{"tool": "search_the_web", "query": "..."}`. Anything else, including
  /// a malformed or empty call, is a final answer carrying `text` unchanged.
  pub fn parse(text: &str) -> Self {
    let query = match TOOL_BLOCK.captures(text) {
      Some(caps) => caps.get(1).and_then(|m| parse_search_call(m.as_str())),
      None => parse_json_call(text),
    };
    match query {
      Some(query) => Self::Search { query },
      None => Self::Answer(text.to_owned()),
    }
  }
}

// ─── Prompts ─────────────────────────────────────────────────────────────────

/// Unsold items grouped by name, expiry and location, with a count.
pub fn inventory_table(items: &[StockedItem]) -> String {
  if items.is_empty() {
    return EMPTY_INVENTORY.to_owned();
  }
  let mut groups: BTreeMap<(&str, NaiveDate, &str), u64> = BTreeMap::new();
  for stocked in items {
    let key = (
      stocked.product_name.as_str(),
      stocked.item.expiry_date,
      stocked.item.location.as_str(),
    );
    *groups.entry(key).or_default() += 1;
  }

  let mut out = String::from("Product_Name | Expiry_Date | Location | Quantity\n");
  for ((name, expiry, location), quantity) in groups {
    let _ = writeln!(out, "{name} | {expiry} | {location} | {quantity}");
  }
  out
}

fn first_prompt(
  today: NaiveDate,
  inventory: &str,
  sales: &str,
  customers: &str,
  question: &str,
) -> String {
  format!(
    r#"### YOUR PERSONA ###
You are 'Larder Assistant', a sustainability and operations analyst for a retail store manager. Provide accurate data, insightful analysis and actionable advice.

### YOUR TOOLS ###
1. Inventory Database: a real-time list of products currently in stock.
2. Web Search: up-to-date information on any topic.

### HOW TO ANSWER ###
1. Work out what the question is asking.
2. If it is about the store's current inventory ("how many", "what's in stock", "where is"), answer ONLY from the INVENTORY DATA below.
3. If it is about sales or customers, answer from the SALES INSIGHTS and CUSTOMER INSIGHTS below.
4. If it is a factual question about the world ("who is", "latest news", "carbon footprint of"), you MUST use Web Search. Respond ONLY with a block of the form <tool_code>{SEARCH_TOOL}("your query")</tool_code>.
5. For ideas or general conversation, answer from your own knowledge.

### YOUR AVAILABLE DATA ###
--- INVENTORY DATA ---
Today's date is {today}.
{inventory}
--- END OF DATA ---

--- SALES INSIGHTS ---
{sales}
--- CUSTOMER INSIGHTS ---
{customers}
--- END OF INSIGHTS ---

### EXAMPLES ###
* Inventory question: "How many cartons of milk do we have?"
  Answer: "We currently have 10 cartons of Milk in stock. Suggestion: since this is a popular item, check the stock again tomorrow to see if a new order is needed."
* Web search question: "What is the latest news on plastic-free packaging?"
  First response: <tool_code>{SEARCH_TOOL}("latest news on plastic-free packaging alternatives for retail")</tool_code>

### YOUR TASK ###
Answer the manager's question according to these rules.

Manager's Question: "{question}""#
  )
}

fn follow_up_prompt(first: &str, query: &str, observation: &str) -> String {
  format!(
    "{first}\n\n<tool_code>{SEARCH_TOOL}({query:?})</tool_code>\n\n<observation>\n{observation}\n\
     </observation>\n\nNow, use the observation from your web search to provide a final, \
     conversational answer."
  )
}

// ─── Responder ───────────────────────────────────────────────────────────────

fn service_failure(e: &ServiceError) -> String {
  match e {
    ServiceError::MissingCredential(_) => format!("Error: {e}."),
    _ => format!("An error occurred while answering: {e}"),
  }
}

/// Answers manager questions from live inventory, the insight datasets and,
/// when the model asks for it, a web search.
pub struct QueryResponder<S, G, W> {
  store:     Arc<S>,
  generator: Arc<G>,
  search:    Arc<W>,
  insights:  Arc<InsightCache>,
}

impl<S, G, W> Clone for QueryResponder<S, G, W> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      generator: self.generator.clone(),
      search:    self.search.clone(),
      insights:  self.insights.clone(),
    }
  }
}

impl<S, G, W> QueryResponder<S, G, W>
where
  S: InventoryStore,
  G: TextGenerator,
  W: WebSearch,
{
  pub fn new(
    store: Arc<S>,
    generator: Arc<G>,
    search: Arc<W>,
    insights: Arc<InsightCache>,
  ) -> Self {
    Self { store, generator, search, insights }
  }

  /// Answer `question` as of today's local date. Never fails: every error
  /// becomes a plain-text description.
  pub async fn answer(&self, question: &str) -> String {
    self.answer_on(question, chrono::Local::now().date_naive()).await
  }

  pub async fn answer_on(&self, question: &str, today: NaiveDate) -> String {
    let items = match self.store.list_unsold(None).await {
      Ok(items) => items,
      Err(e) => {
        tracing::error!("chatbot could not read inventory: {e}");
        return format!("Error fetching data from the database: {e}");
      }
    };
    let prompt = first_prompt(
      today,
      &inventory_table(&items),
      &self.insights.sales_report(),
      &self.insights.customer_report(),
      question,
    );

    let reply = match self.generator.generate(&prompt).await {
      Ok(reply) => reply,
      Err(e) => {
        tracing::warn!("chatbot model call failed: {e}");
        return service_failure(&e);
      }
    };

    let query = match ModelReply::parse(&reply) {
      ModelReply::Answer(answer) => return answer,
      ModelReply::Search { query } => query,
    };

    tracing::info!(%query, "chatbot is searching the web");
    let observation = match self.search.search(&query).await {
      Ok(text) => text,
      Err(e) => {
        tracing::warn!("chatbot web search failed: {e}");
        return service_failure(&e);
      }
    };

    match self.generator.generate(&follow_up_prompt(&prompt, &query, &observation)).await {
      Ok(answer) => answer,
      Err(e) => {
        tracing::warn!("chatbot follow-up model call failed: {e}");
        service_failure(&e)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use larder_core::{item::StockReceipt, product::NewProductType};
  use larder_store_sqlite::SqliteStore;

  use super::*;
  use crate::fakes::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  async fn milk_store(quantity: u32) -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let milk = store
      .create_product_type(NewProductType::new("milk", 1.2).unwrap())
      .await
      .unwrap()
      .id;
    store
      .receive_stock(
        StockReceipt::new(milk, quantity, date(2026, 10, 18), date(2026, 10, 25), "Fridge A")
          .unwrap(),
      )
      .await
      .unwrap();
    Arc::new(store)
  }

  fn responder(
    store: Arc<SqliteStore>,
    generator: Arc<FakeGenerator>,
    search: Arc<FakeSearch>,
  ) -> QueryResponder<SqliteStore, FakeGenerator, FakeSearch> {
    QueryResponder::new(store, generator, search, Arc::new(InsightCache::new("/nonexistent")))
  }

  #[test]
  fn parses_tool_code_block() {
    assert_eq!(
      ModelReply::parse(r#"<tool_code>search_the_web("current CEO of Microsoft")</tool_code>"#),
      ModelReply::Search { query: "current CEO of Microsoft".into() }
    );
    assert_eq!(
      ModelReply::parse(
        "Let me check.\n<tool_code>\n```python\nsearch_the_web(query='price of \\'oat\\' milk')\n```\n</tool_code>"
      ),
      ModelReply::Search { query: "price of 'oat' milk".into() }
    );
  }

  #[test]
  fn parses_json_tool_call() {
    assert_eq!(
      ModelReply::parse(r#"{"tool": "search_the_web", "query": "egg prices"}"#),
      ModelReply::Search { query: "egg prices".into() }
    );
  }

  #[test]
  fn malformed_calls_fall_back_to_answer() {
    for text in [
      "We have 10 cartons of Milk.",
      "<tool_code>search_the_web()</tool_code>",
      r#"<tool_code>search_the_web("  ")</tool_code>"#,
      r#"<tool_code>delete_everything("now")</tool_code>"#,
      r#"{"tool": "other", "query": "x"}"#,
    ] {
      assert_eq!(ModelReply::parse(text), ModelReply::Answer(text.to_owned()), "{text}");
    }
  }

  #[test]
  fn empty_inventory_has_placeholder() {
    assert_eq!(inventory_table(&[]), EMPTY_INVENTORY);
  }

  #[tokio::test]
  async fn plain_reply_is_returned_unmodified() {
    let store = milk_store(10).await;
    let reply = "We currently have 10 cartons of Milk in stock.";
    let generator = Arc::new(FakeGenerator::replying([reply]));
    let search = Arc::new(FakeSearch::returning("unused"));
    let bot = responder(store, generator.clone(), search.clone());

    let answer = bot.answer_on("How many cartons of milk do we have?", date(2026, 10, 19)).await;
    assert_eq!(answer, reply);
    assert!(search.queries().is_empty());

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Today's date is 2026-10-19."));
    assert!(prompts[0].contains("Milk | 2026-10-25 | Fridge A | 10"));
    assert!(prompts[0].contains("Sales data is not available."));
    assert!(prompts[0].contains("Customer data is not available."));
    assert!(prompts[0].contains(r#"Manager's Question: "How many cartons of milk do we have?""#));
  }

  #[tokio::test]
  async fn tool_request_searches_then_asks_again() {
    let store = milk_store(1).await;
    let generator = Arc::new(FakeGenerator::replying([
      r#"<tool_code>search_the_web("current CEO of Microsoft")</tool_code>"#,
      "Satya Nadella is the CEO of Microsoft.",
    ]));
    let search = Arc::new(FakeSearch::returning("Satya Nadella, CEO since 2014"));
    let bot = responder(store, generator.clone(), search.clone());

    let answer = bot.answer_on("Who runs Microsoft?", date(2026, 10, 19)).await;
    assert_eq!(answer, "Satya Nadella is the CEO of Microsoft.");
    assert_eq!(search.queries(), vec!["current CEO of Microsoft".to_owned()]);

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with(&prompts[0]));
    assert!(prompts[1].contains("<observation>\nSatya Nadella, CEO since 2014\n</observation>"));
  }

  #[tokio::test]
  async fn missing_model_key_is_described() {
    let store = milk_store(1).await;
    let search = Arc::new(FakeSearch::returning("unused"));
    let generator = Arc::new(FakeGenerator::failing(ServiceError::MissingCredential("Gemini")));
    let bot = responder(store, generator, search.clone());

    let answer = bot.answer_on("anything", date(2026, 10, 19)).await;
    assert_eq!(answer, "Error: Gemini API key is not configured.");
    assert!(search.queries().is_empty());
  }

  #[tokio::test]
  async fn search_failure_ends_the_exchange() {
    let store = milk_store(1).await;
    let generator = Arc::new(FakeGenerator::replying([
      r#"<tool_code>search_the_web("weather")</tool_code>"#,
    ]));
    let search = Arc::new(FakeSearch::failing(ServiceError::Transport {
      service: "Serper",
      message: "connection refused".into(),
    }));
    let bot = responder(store, generator.clone(), search);

    let answer = bot.answer_on("Will it rain?", date(2026, 10, 19)).await;
    assert!(answer.contains("connection refused"), "{answer}");
    assert_eq!(generator.calls(), 1);
  }
}
