//! Resuming an interrupted run.

use crate::error::RunnerResult;
use synprobe_store::SentenceStore;
use tracing::info;

/// Text of the last sentence a previous run stored, if any.
pub async fn find_resume_point<S>(store: &S) -> RunnerResult<Option<String>>
where
    S: SentenceStore + ?Sized,
{
    match store.last_sentence().await? {
        Some(record) => {
            info!(
                sentence_id = %record.id,
                sentence = %record.sentence.sentence,
                "resuming after last stored sentence"
            );
            Ok(Some(record.sentence.sentence))
        }
        None => {
            info!("no stored sentences, starting from the first seed");
            Ok(None)
        }
    }
}

/// Skips seeds up to and including the resume point.
///
/// Without a resume point every item passes. With one, nothing passes until
/// an item carrying its text has been seen. A resume point missing from
/// the input therefore yields nothing, and [`ResumeFilter::reached`] stays
/// false once the input is exhausted.
pub struct ResumeFilter<I, F> {
    inner: I,
    is_resume_point: F,
    resume_point: Option<String>,
    skipped: usize,
}

impl<I, F> ResumeFilter<I, F>
where
    I: Iterator,
    F: FnMut(&I::Item, &str) -> bool,
{
    /// `is_resume_point` tells whether an item carries the resume point's
    /// text. Items before it, read errors included, are dropped.
    pub fn new(inner: I, resume_point: Option<String>, is_resume_point: F) -> Self {
        Self {
            inner,
            is_resume_point,
            resume_point,
            skipped: 0,
        }
    }

    /// Whether the resume point has been passed.
    pub fn reached(&self) -> bool {
        self.resume_point.is_none()
    }

    /// Items dropped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<I, F> Iterator for ResumeFilter<I, F>
where
    I: Iterator,
    F: FnMut(&I::Item, &str) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.inner.next()?;
            let Some(point) = self.resume_point.as_deref() else {
                return Some(item);
            };
            let matched = (self.is_resume_point)(&item, point);
            self.skipped += 1;
            if matched {
                self.resume_point = None;
            }
        }
    }
}
