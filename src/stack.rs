use crate::config::StackConfig;
use crate::error::{classify, Error};
use crate::logger::Logger;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudformation::client::Waiters;
use aws_sdk_cloudformation::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::types::{Capability, StackStatus};
use aws_sdk_s3::primitives::ByteStream;
use indicatif::ProgressBar;
use std::time::Duration;

/// CloudFormation rejects inline template bodies above this size,
/// larger ones go through the template bucket
const MAX_INLINE_TEMPLATE: usize = 51_200;

/// Upper bound on waiting for the stack to reach a terminal state
const WAIT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Permit every resource update, the storage bucket is guarded by its
/// Retain deletion policy instead
pub const STACK_POLICY: &str = r#"{ "Statement" : [
    {
        "Effect" : "Allow",
        "Principal" : "*",
        "Action" : "Update:*",
        "Resource" : "*"
    }
]}"#;

/// A named remote stack in a concrete region
pub struct Stack {
    name: String,
    region: String,
    template_bucket: String,
    notification_arn: Option<String>,
    client: aws_sdk_cloudformation::Client,
    s3: aws_sdk_s3::Client,
}

/// Which operation reconciliation decided to issue
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Create,
    Update,
}

/// Terminal result of a reconciliation run
#[derive(Debug)]
pub enum Outcome {
    /// The stack was created or updated and reached a stable state
    Applied { stack_id: String },

    /// The template matches the remote state, nothing was issued
    Unchanged { stack_id: String },
}

/// How the template body reaches CloudFormation
enum TemplateLocation {
    Body(String),
    Url(String),
}

/// Decide the operation from the remote stack state
///
/// An operation already in flight means another run owns the stack, fail
/// fast instead of racing it.
fn plan(name: &str, status: Option<&StackStatus>) -> Result<Action, Error> {
    match status {
        None => Ok(Action::Create),
        Some(status) if status.as_str().ends_with("IN_PROGRESS") => Err(Error::StackBusy {
            name: name.to_string(),
            status: status.as_str().to_string(),
        }),
        Some(_) => Ok(Action::Update),
    }
}

/// The provider reports an idempotent no-op update as an error, it is not one
fn is_no_update(message: Option<&str>) -> bool {
    message.is_some_and(|m| m.contains("No updates are to be performed"))
}

fn fits_inline(body: &str) -> bool {
    body.len() <= MAX_INLINE_TEMPLATE
}

/// Map a failed SDK call onto the local error taxonomy, keeping the
/// provider's message verbatim
fn remote_error<E, R>(error: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    let message = error
        .message()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("{error:?}"));

    classify(error.code(), message)
}

impl Stack {
    pub async fn new(config: &StackConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::v2025_01_17())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        Stack {
            name: config.stack_name.clone(),
            region: config.region.clone(),
            template_bucket: config.template_bucket.clone(),
            notification_arn: config.notification_arn.clone(),
            client: aws_sdk_cloudformation::Client::new(&sdk_config),
            s3: aws_sdk_s3::Client::new(&sdk_config),
        }
    }

    /// Bring the remote stack in line with the template
    ///
    /// Creates the stack when absent, updates it when present and stable,
    /// and refuses to touch it while another operation is in progress.
    pub async fn reconcile(&self, template_body: &str, policy: &str) -> Result<Outcome, Error> {
        let status = self.status().await?;
        let action = plan(&self.name, status.as_ref())?;
        let location = self.template_location(template_body).await?;

        match action {
            Action::Create => self.create(&location, policy).await?,
            Action::Update => {
                if !self.update(&location, policy).await? {
                    log::info!("No updates to perform on \"{}\"", self.name);

                    return Ok(Outcome::Unchanged {
                        stack_id: self.stack_id().await?,
                    });
                }
            }
        }

        self.wait(action).await?;

        Ok(Outcome::Applied {
            stack_id: self.stack_id().await?,
        })
    }

    /// Declared outputs of the remote stack
    pub async fn outputs(&self) -> Result<Vec<(String, String)>, Error> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(&self.name)
            .send()
            .await
            .map_err(remote_error)?;

        Ok(response
            .stacks()
            .first()
            .map(|stack| {
                stack
                    .outputs()
                    .iter()
                    .filter_map(|output| {
                        Some((
                            output.output_key()?.to_string(),
                            output.output_value()?.to_string(),
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Current remote state, None when the stack does not exist
    async fn status(&self) -> Result<Option<StackStatus>, Error> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(&self.name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output
                .stacks()
                .first()
                .and_then(|stack| stack.stack_status().cloned())),

            // CloudFormation reports a missing stack as a validation error
            Err(error) if error.code() == Some("ValidationError") => Ok(None),
            Err(error) => Err(remote_error(error)),
        }
    }

    async fn stack_id(&self) -> Result<String, Error> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(&self.name)
            .send()
            .await
            .map_err(remote_error)?;

        Ok(response
            .stacks()
            .first()
            .and_then(|stack| stack.stack_id())
            .map(str::to_string)
            .unwrap_or_else(|| self.name.clone()))
    }

    /// Pass the body inline when it fits, otherwise park it in the template
    /// bucket and hand CloudFormation the URL
    async fn template_location(&self, body: &str) -> Result<TemplateLocation, Error> {
        if fits_inline(body) {
            return Ok(TemplateLocation::Body(body.to_string()));
        }

        let key = format!("{}.template.json", self.name);

        log::debug!(
            "Template body over the inline limit, uploading to s3://{}/{key}",
            self.template_bucket
        );

        self.s3
            .put_object()
            .bucket(&self.template_bucket)
            .key(&key)
            .body(ByteStream::from(body.as_bytes().to_vec()))
            .send()
            .await
            .map_err(remote_error)?;

        Ok(TemplateLocation::Url(format!(
            "https://{}.s3.{}.amazonaws.com/{key}",
            self.template_bucket, self.region
        )))
    }

    async fn create(&self, location: &TemplateLocation, policy: &str) -> Result<(), Error> {
        let request = self
            .client
            .create_stack()
            .stack_name(&self.name)
            .capabilities(Capability::CapabilityIam)
            .stack_policy_body(policy);

        let request = match location {
            TemplateLocation::Body(body) => request.template_body(body),
            TemplateLocation::Url(url) => request.template_url(url),
        };

        let request = match &self.notification_arn {
            Some(arn) => request.notification_arns(arn),
            None => request,
        };

        request.send().await.map_err(remote_error)?;

        Ok(())
    }

    /// Issue the update, returns false when the provider had nothing to do
    async fn update(&self, location: &TemplateLocation, policy: &str) -> Result<bool, Error> {
        // Refresh the policy first so the update itself runs under it
        self.client
            .set_stack_policy()
            .stack_name(&self.name)
            .stack_policy_body(policy)
            .send()
            .await
            .map_err(remote_error)?;

        let request = self
            .client
            .update_stack()
            .stack_name(&self.name)
            .capabilities(Capability::CapabilityIam);

        let request = match location {
            TemplateLocation::Body(body) => request.template_body(body),
            TemplateLocation::Url(url) => request.template_url(url),
        };

        let request = match &self.notification_arn {
            Some(arn) => request.notification_arns(arn),
            None => request,
        };

        match request.send().await {
            Ok(_) => Ok(true),
            Err(error) if is_no_update(error.message()) => Ok(false),
            Err(error) => Err(remote_error(error)),
        }
    }

    /// Block on the SDK waiter until the operation settles
    async fn wait(&self, action: Action) -> Result<(), Error> {
        let spinner = Logger::multi_progress().add(ProgressBar::new_spinner());

        spinner.set_message(match action {
            Action::Create => "Creating stack...",
            Action::Update => "Updating stack...",
        });
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = match action {
            Action::Create => self
                .client
                .wait_until_stack_create_complete()
                .stack_name(&self.name)
                .wait(WAIT_TIMEOUT)
                .await
                .map(|_| ())
                .map_err(|error| format!("{error:?}")),

            Action::Update => self
                .client
                .wait_until_stack_update_complete()
                .stack_name(&self.name)
                .wait(WAIT_TIMEOUT)
                .await
                .map(|_| ())
                .map_err(|error| format!("{error:?}")),
        };

        spinner.finish_and_clear();

        if let Err(waiter_error) = result {
            let reasons = self.failure_reasons().await.unwrap_or_default();

            if reasons.is_empty() {
                return Err(Error::Provider(waiter_error));
            }

            return Err(Error::Provider(reasons.join("; ")));
        }

        Ok(())
    }

    /// Resource failure reasons of the operation that just finished
    ///
    /// Events come newest first, the "User Initiated" stack event marks
    /// where the current operation started.
    async fn failure_reasons(&self) -> Result<Vec<String>, Error> {
        let mut next_token = None;
        let mut reasons = Vec::new();

        'pages: loop {
            let mut request = self.client.describe_stack_events().stack_name(&self.name);

            if let Some(token) = next_token {
                request = request.next_token(token);
            }

            let response = request.send().await.map_err(remote_error)?;

            for event in response.stack_events() {
                let is_stack_event = event.resource_type() == Some("AWS::CloudFormation::Stack");
                let reason = event.resource_status_reason().unwrap_or_default();

                if is_stack_event && reason == "User Initiated" {
                    break 'pages;
                }

                let failed = event
                    .resource_status()
                    .is_some_and(|status| status.as_str().contains("FAILED"));

                if failed && !reason.is_empty() && reason != "Resource creation cancelled" {
                    reasons.push(format!(
                        "{}: {reason}",
                        event.logical_resource_id().unwrap_or_default()
                    ));
                }
            }

            next_token = response.next_token().map(|token| token.to_string());

            if next_token.is_none() {
                break;
            }
        }

        Ok(reasons)
    }
}
