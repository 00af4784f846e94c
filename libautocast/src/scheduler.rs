//! Wall-clock triggers and the draft lifecycle
//!
//! A [`Schedule`] holds one weekly generation trigger and any number of
//! daily posting triggers. [`ContentScheduler::tick`] is called once per
//! poll with the current local time and fires whatever is due.
//!
//! Posting triggers name an intended platform, but by default the post
//! chosen is simply the first draft in the queue, whatever its platform.
//! Set `scheduling.filter_by_platform` to restrict each trigger to drafts
//! for its own platform.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use tracing::{debug, error, info, warn};

use crate::config::{Config, SchedulingConfig};
use crate::error::{ConfigError, Result};
use crate::generator::ContentGenerator;
use crate::platforms::create_platforms;
use crate::poster::PlatformPoster;
use crate::store::QueueStore;
use crate::types::{Post, PostStatus};

/// What a trigger does when it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerAction {
    Generate,
    Post { platform: String },
}

#[derive(Debug, Clone)]
struct WeeklyTrigger {
    weekday: Weekday,
    time: NaiveTime,
}

#[derive(Debug, Clone)]
struct DailyTrigger {
    time: NaiveTime,
    platform: String,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    generation: WeeklyTrigger,
    posting: Vec<DailyTrigger>,
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not HH:MM ({})", value, e),
        }
    })?;
    Ok(time)
}

/// Whether a trigger at `time` (on `weekday`, if given) falls in `(since, now]`
fn occurs_between(
    since: NaiveDateTime,
    now: NaiveDateTime,
    time: NaiveTime,
    weekday: Option<Weekday>,
) -> bool {
    if now <= since {
        return false;
    }
    let span_days = (now.date() - since.date()).num_days();
    if span_days > 7 {
        return true;
    }
    (0..=span_days)
        .map(|n| since.date() + Duration::days(n))
        .filter(|day| weekday.map_or(true, |w| day.weekday() == w))
        .map(|day| day.and_time(time))
        .any(|at| since < at && at <= now)
}

/// Start of the minute containing `now`
fn minute_start(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

impl Schedule {
    pub fn from_config(config: &SchedulingConfig) -> Result<Self> {
        let weekday = config
            .generation
            .day
            .trim()
            .parse::<Weekday>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "scheduling.generation.day".to_string(),
                reason: format!("'{}' is not a weekday", config.generation.day),
            })?;
        let generation = WeeklyTrigger {
            weekday,
            time: parse_time("scheduling.generation.time", &config.generation.time)?,
        };

        let posting = config
            .posting
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                Ok(DailyTrigger {
                    time: parse_time(&format!("scheduling.posting[{}].time", i), &slot.time)?,
                    platform: slot.platform.trim().to_lowercase(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            generation,
            posting,
        })
    }

    /// Triggers whose time falls in `(since, now]`, generation first
    ///
    /// A trigger that came due several times in the window is listed once.
    pub fn due_between(&self, since: NaiveDateTime, now: NaiveDateTime) -> Vec<TriggerAction> {
        let mut due = Vec::new();

        if occurs_between(since, now, self.generation.time, Some(self.generation.weekday)) {
            due.push(TriggerAction::Generate);
        }

        for trigger in &self.posting {
            if occurs_between(since, now, trigger.time, None) {
                due.push(TriggerAction::Post {
                    platform: trigger.platform.clone(),
                });
            }
        }

        due
    }

    /// Earliest trigger strictly after `now`
    pub fn next_after(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, TriggerAction)> {
        let today = now.date();
        let mut candidates = Vec::new();

        let days_ahead = (7 + self.generation.weekday.num_days_from_monday() as i64
            - now.weekday().num_days_from_monday() as i64)
            % 7;
        let mut generation_at = (today + Duration::days(days_ahead)).and_time(self.generation.time);
        if generation_at <= now {
            generation_at += Duration::days(7);
        }
        candidates.push((generation_at, TriggerAction::Generate));

        for trigger in &self.posting {
            let mut at = today.and_time(trigger.time);
            if at <= now {
                at += Duration::days(1);
            }
            candidates.push((
                at,
                TriggerAction::Post {
                    platform: trigger.platform.clone(),
                },
            ));
        }

        candidates.into_iter().min_by_key(|(at, _)| *at)
    }
}

/// Result of one "post one" attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    /// Published; the queue entry is now `posted`
    Posted(Post),
    /// Publish failed; the queue entry is untouched
    Failed(Post),
    /// No eligible draft
    QueueEmpty,
}

/// Owns the queue, the generator and the poster, and runs the lifecycle
pub struct ContentScheduler {
    store: QueueStore,
    generator: ContentGenerator,
    poster: PlatformPoster,
    schedule: Schedule,
    ideas_per_week: usize,
    filter_by_platform: bool,
    last_tick: Option<NaiveDateTime>,
}

impl ContentScheduler {
    pub fn new(
        store: QueueStore,
        generator: ContentGenerator,
        poster: PlatformPoster,
        schedule: Schedule,
    ) -> Self {
        Self {
            store,
            generator,
            poster,
            schedule,
            ideas_per_week: 7,
            filter_by_platform: false,
            last_tick: None,
        }
    }

    pub fn with_ideas_per_week(mut self, count: usize) -> Self {
        self.ideas_per_week = count;
        self
    }

    pub fn with_platform_filter(mut self, enabled: bool) -> Self {
        self.filter_by_platform = enabled;
        self
    }

    /// Wire up store, generator, platforms and schedule from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = QueueStore::open(config.queue_path()?);
        let generator = ContentGenerator::from_config(&config.generator)?;
        let platforms = create_platforms(&config.platforms, config.generator.timeout_secs)?;
        let schedule = Schedule::from_config(&config.scheduling)?;

        Ok(Self::new(store, generator, PlatformPoster::new(platforms), schedule)
            .with_ideas_per_week(config.generator.ideas_per_week)
            .with_platform_filter(config.scheduling.filter_by_platform))
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Weekly generation: ideas, then one draft per idea, then one append
    ///
    /// Ideas whose drafting call fails are dropped. Returns the number of
    /// drafts added.
    pub async fn generate_weekly_content(&self) -> Result<usize> {
        let ideas = self.generator.generate_ideas(self.ideas_per_week).await;
        info!("Drafting {} idea(s)", ideas.len());

        let mut drafts = Vec::with_capacity(ideas.len());
        for idea in ideas {
            match self.generator.create_post(&idea).await {
                Ok(content) => drafts.push(Post::draft(idea, content)),
                Err(e) => warn!("Dropping idea '{}': {}", idea.topic, e),
            }
        }

        let added = drafts.len();
        self.store.append(drafts)?;
        info!("Queued {} new draft(s)", added);
        Ok(added)
    }

    /// Publish the first draft in queue order
    ///
    /// `intended` is the platform of the trigger that fired; it only narrows
    /// the choice when the platform filter is on.
    pub async fn post_next(&self, intended: Option<&str>) -> Result<PostOutcome> {
        let filter = if self.filter_by_platform { intended } else { None };

        let Some(mut post) = self.store.find_first(PostStatus::Draft, filter)? else {
            info!("No drafts to post");
            return Ok(PostOutcome::QueueEmpty);
        };

        if let Some(intended) = intended {
            if intended != post.platform {
                debug!(
                    "Trigger for {} is posting a {} draft",
                    intended, post.platform
                );
            }
        }

        if !self.poster.post(&post.platform, &post.content).await {
            return Ok(PostOutcome::Failed(post));
        }

        post.mark_posted(Utc::now());
        self.store.update(&post)?;
        info!("Post {} marked posted", post.id);
        Ok(PostOutcome::Posted(post))
    }

    /// Fire every trigger that came due since the previous tick
    ///
    /// The first tick only looks at the minute containing `now`. Later
    /// ticks cover everything after the previous one, so a slow or late
    /// poll still fires a trigger it stepped over, and each trigger fires
    /// once per occurrence. Failures are logged and left for the next
    /// trigger.
    pub async fn tick(&mut self, now: NaiveDateTime) -> Vec<TriggerAction> {
        let since = match self.last_tick {
            Some(last) if now < last => {
                warn!(
                    "Clock moved back from {} to {}; waiting for it to catch up",
                    last, now
                );
                return Vec::new();
            }
            Some(last) => last,
            None => minute_start(now) - Duration::seconds(1),
        };
        self.last_tick = Some(now);

        let fired = self.schedule.due_between(since, now);
        for action in &fired {
            match action {
                TriggerAction::Generate => {
                    info!("Weekly generation trigger fired");
                    if let Err(e) = self.generate_weekly_content().await {
                        error!("Weekly generation failed: {}", e);
                    }
                }
                TriggerAction::Post { platform } => {
                    info!("Posting trigger fired ({})", platform);
                    match self.post_next(Some(platform.as_str())).await {
                        Ok(PostOutcome::Failed(post)) => {
                            warn!("Post {} stays a draft until the next trigger", post.id)
                        }
                        Ok(_) => {}
                        Err(e) => error!("Posting failed: {}", e),
                    }
                }
            }
        }

        fired
    }
}
