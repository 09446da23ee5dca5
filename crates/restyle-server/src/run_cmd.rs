use clap::Args;
use restyle_core::studio::Studio;
use restyle_core::{AnalyzeError, GenerateError};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// YouTube link (or bare video id) to learn the style from
    pub video_link: String,

    /// Topic for the new script; prompted on stdin when omitted
    #[arg(long)]
    pub topic: Option<String>,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("analysis failed: {0}")]
    Analyze(#[from] AnalyzeError),
    #[error("{0}")]
    Generate(#[from] GenerateError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("topic must not be empty")]
    EmptyTopic,
}

/// Analyze one video, then write a script on the topic and print it.
pub fn run(
    args: &RunArgs,
    studio: &Studio,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<(), RunError> {
    let profile = studio.analyze(&args.video_link)?;

    let topic = match args.topic.as_deref() {
        Some(topic) => topic.trim().to_string(),
        None => {
            write!(output, "Enter the topic you want to create a video script for: ")?;
            output.flush()?;
            let mut line = String::new();
            input.read_line(&mut line)?;
            line.trim().to_string()
        }
    };
    if topic.is_empty() {
        return Err(RunError::EmptyTopic);
    }

    let script = studio.generate(&profile, &topic)?;
    writeln!(output, "\nGenerated Video Script:\n{script}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use restyle_core::VideoId;
    use restyle_core::provider::{
        ChatChoice, ChatMessage, ChatProvider, ChatRequest, ChatResponse,
    };
    use restyle_core::studio::StudioSettings;
    use restyle_core::transcript::TranscriptSource;
    use restyle_core::{ProviderError, TranscriptError};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    struct QueuedReplies(Mutex<Vec<&'static str>>);

    impl ChatProvider for QueuedReplies {
        fn name(&self) -> &'static str {
            "queued"
        }

        fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            let content = self.0.lock().unwrap().remove(0);
            Ok(ChatResponse {
                choices: vec![ChatChoice {
                    message: ChatMessage {
                        role: "assistant".to_string(),
                        content: content.to_string(),
                    },
                }],
            })
        }
    }

    struct OneLine;

    impl TranscriptSource for OneLine {
        fn name(&self) -> &'static str {
            "one-line"
        }

        fn fetch(&self, _video_id: &VideoId) -> Result<Vec<String>, TranscriptError> {
            Ok(vec!["today we build a desk".to_string()])
        }
    }

    fn studio(replies: Vec<&'static str>) -> Studio {
        Studio::new(
            Arc::new(QueuedReplies(Mutex::new(replies))),
            Arc::new(OneLine),
            StudioSettings::default(),
        )
    }

    #[test]
    fn prompts_for_topic_when_missing() {
        let studio = studio(vec!["tone: Calm", "Let's build a bookshelf."]);
        let args = RunArgs {
            video_link: "dQw4w9WgXcQ".to_string(),
            topic: None,
        };
        let mut input = Cursor::new("bookshelf\n");
        let mut output = Vec::new();
        run(&args, &studio, &mut input, &mut output).unwrap();

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.starts_with("Enter the topic"));
        assert!(printed.ends_with("Generated Video Script:\nLet's build a bookshelf.\n"));
    }

    #[test]
    fn empty_topic_is_rejected() {
        let studio = studio(vec!["tone: Calm"]);
        let args = RunArgs {
            video_link: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            topic: Some("   ".to_string()),
        };
        let err = run(&args, &studio, &mut Cursor::new(""), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, RunError::EmptyTopic));
    }

    #[test]
    fn invalid_link_stops_before_prompting() {
        let studio = studio(vec![]);
        let args = RunArgs {
            video_link: "not a link".to_string(),
            topic: None,
        };
        let mut output: Vec<u8> = Vec::new();
        let err = run(&args, &studio, &mut Cursor::new("topic\n"), &mut output).unwrap_err();
        assert!(matches!(err, RunError::Analyze(AnalyzeError::InvalidLink(_))));
        assert!(output.is_empty());
    }
}
