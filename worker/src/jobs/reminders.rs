use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use crates::application::usecases::{feature_access::FeatureAccessUseCase, quota::QuotaUseCase};
use crates::domain::{
    entities::{contacts::ContactEntity, tenants::TenantEntity},
    repositories::{
        contacts::ContactRepository, daily_quota::DailyQuotaRepository,
        messaging::MessagingGateway, plans::PlanRepository, tenants::TenantRepository,
    },
    value_objects::{enums::feature_flags::FeatureFlag, phone::PhoneNumber},
};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Tenants processed concurrently per batch; bounded for the gateway's
/// rate limits.
pub const JOB_BATCH_SIZE: usize = 5;

/// A contact is due a return reminder this many days after their last visit.
pub const RETURN_REMINDER_AFTER_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    Birthday,
    ReturnVisit,
}

impl ReminderKind {
    fn feature(self) -> FeatureFlag {
        match self {
            ReminderKind::Birthday => FeatureFlag::BirthdayReminder,
            ReminderKind::ReturnVisit => FeatureFlag::PostVisitFeedback,
        }
    }

    fn job_name(self) -> &'static str {
        match self {
            ReminderKind::Birthday => "birthday-reminders",
            ReminderKind::ReturnVisit => "return-reminders",
        }
    }

    fn campaign_id(self, date: NaiveDate) -> String {
        match self {
            ReminderKind::Birthday => format!("birthday-{date}"),
            ReminderKind::ReturnVisit => format!("return-{date}"),
        }
    }

    fn render_message(self, contact: &ContactEntity, tenant: &TenantEntity) -> String {
        match self {
            ReminderKind::Birthday => format!(
                "Happy birthday, {}! Everyone at {} wishes you a wonderful day.",
                contact.name, tenant.business_name
            ),
            ReminderKind::ReturnVisit => format!(
                "Hi {}, it has been a while since your last visit to {}. We would love to see you again, book anytime!",
                contact.name, tenant.business_name
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantJobFailure {
    pub tenant_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderJobSummary {
    pub job: &'static str,
    pub date: NaiveDate,
    pub tenants_processed: usize,
    pub tenants_skipped: usize,
    pub messages_sent: usize,
    pub messages_denied_quota: usize,
    pub send_failures: usize,
    pub tenant_failures: Vec<TenantJobFailure>,
}

impl ReminderJobSummary {
    fn new(job: &'static str, date: NaiveDate) -> Self {
        Self {
            job,
            date,
            tenants_processed: 0,
            tenants_skipped: 0,
            messages_sent: 0,
            messages_denied_quota: 0,
            send_failures: 0,
            tenant_failures: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct TenantOutcome {
    skipped: bool,
    sent: usize,
    denied_quota: usize,
    send_failures: usize,
}

/// Scheduled reminder dispatch. Per tenant: feature gate, contact lookup,
/// quota gate per message, gateway send. Tenants run concurrently in
/// bounded batches and one tenant's failure never aborts the job.
pub struct ReminderJobs<P, T, Q, C, G>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
    Q: DailyQuotaRepository + Send + Sync + 'static,
    C: ContactRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    access: Arc<FeatureAccessUseCase<P>>,
    tenant_repo: Arc<T>,
    quota: Arc<QuotaUseCase<Q>>,
    contact_repo: Arc<C>,
    gateway: Arc<G>,
}

impl<P, T, Q, C, G> Clone for ReminderJobs<P, T, Q, C, G>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
    Q: DailyQuotaRepository + Send + Sync + 'static,
    C: ContactRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            access: Arc::clone(&self.access),
            tenant_repo: Arc::clone(&self.tenant_repo),
            quota: Arc::clone(&self.quota),
            contact_repo: Arc::clone(&self.contact_repo),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<P, T, Q, C, G> ReminderJobs<P, T, Q, C, G>
where
    P: PlanRepository + Send + Sync + 'static,
    T: TenantRepository + Send + Sync + 'static,
    Q: DailyQuotaRepository + Send + Sync + 'static,
    C: ContactRepository + Send + Sync + 'static,
    G: MessagingGateway + Send + Sync + 'static,
{
    pub fn new(
        access: Arc<FeatureAccessUseCase<P>>,
        tenant_repo: Arc<T>,
        quota: Arc<QuotaUseCase<Q>>,
        contact_repo: Arc<C>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            access,
            tenant_repo,
            quota,
            contact_repo,
            gateway,
        }
    }

    /// `date` is pinned once per run; a job straddling midnight keeps
    /// charging the day it started on.
    pub async fn run(&self, kind: ReminderKind, date: NaiveDate) -> Result<ReminderJobSummary> {
        let tenants = self.tenant_repo.list_connected().await?;
        let mut summary = ReminderJobSummary::new(kind.job_name(), date);

        for chunk in tenants.chunks(JOB_BATCH_SIZE) {
            let mut tasks = JoinSet::new();

            for tenant in chunk {
                let this = self.clone();
                let tenant = tenant.clone();
                tasks.spawn(async move {
                    let outcome = this.process_tenant(&tenant, kind, date).await;
                    (tenant.id, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((_, Ok(outcome))) if outcome.skipped => {
                        summary.tenants_skipped += 1;
                    }
                    Ok((_, Ok(outcome))) => {
                        summary.tenants_processed += 1;
                        summary.messages_sent += outcome.sent;
                        summary.messages_denied_quota += outcome.denied_quota;
                        summary.send_failures += outcome.send_failures;
                    }
                    Ok((tenant_id, Err(err))) => {
                        error!(
                            %tenant_id,
                            job = kind.job_name(),
                            error = ?err,
                            "reminders: tenant processing failed"
                        );
                        summary.tenant_failures.push(TenantJobFailure {
                            tenant_id,
                            error: err.to_string(),
                        });
                    }
                    Err(join_err) => {
                        error!(
                            job = kind.job_name(),
                            error = ?join_err,
                            "reminders: tenant task aborted"
                        );
                    }
                }
            }
        }

        info!(
            job = kind.job_name(),
            %date,
            tenants_processed = summary.tenants_processed,
            tenants_skipped = summary.tenants_skipped,
            messages_sent = summary.messages_sent,
            messages_denied_quota = summary.messages_denied_quota,
            send_failures = summary.send_failures,
            tenant_failures = summary.tenant_failures.len(),
            "reminders: job completed"
        );

        Ok(summary)
    }

    async fn process_tenant(
        &self,
        tenant: &TenantEntity,
        kind: ReminderKind,
        date: NaiveDate,
    ) -> Result<TenantOutcome> {
        let decision = self.access.can_use_feature(tenant, kind.feature()).await?;
        if !decision.allowed {
            debug!(
                tenant_id = %tenant.id,
                job = kind.job_name(),
                "reminders: tenant not entitled, skipping"
            );
            return Ok(TenantOutcome {
                skipped: true,
                ..TenantOutcome::default()
            });
        }

        let contacts = match kind {
            ReminderKind::Birthday => {
                self.contact_repo
                    .list_birthday_contacts(tenant.id, date.month() as i32, date.day() as i32)
                    .await?
            }
            ReminderKind::ReturnVisit => {
                let visit_day = date - Duration::days(RETURN_REMINDER_AFTER_DAYS);
                let window_start = visit_day.and_time(NaiveTime::MIN).and_utc();
                let window_end = window_start + Duration::days(1);
                self.contact_repo
                    .list_return_due_contacts(tenant.id, window_start, window_end)
                    .await?
            }
        };

        let mut outcome = TenantOutcome::default();
        if contacts.is_empty() {
            return Ok(outcome);
        }

        let limit = self
            .access
            .effective_plan(tenant)
            .await?
            .features
            .daily_message_limit_or_default();
        let campaign_id = kind.campaign_id(date);

        for contact in &contacts {
            let phone = match PhoneNumber::parse(&contact.phone) {
                Ok(phone) => phone,
                Err(err) => {
                    warn!(
                        tenant_id = %tenant.id,
                        contact_id = %contact.id,
                        error = %err,
                        "reminders: skipping contact with invalid phone"
                    );
                    outcome.send_failures += 1;
                    continue;
                }
            };

            let quota_decision = self
                .quota
                .check_and_increment(tenant.id, date, &campaign_id, limit)
                .await?;
            if !quota_decision.allowed {
                outcome.denied_quota += 1;
                continue;
            }

            let message = kind.render_message(contact, tenant);
            match self
                .gateway
                .send_text(&tenant.instance_token, phone.as_str(), &message)
                .await
            {
                Ok(()) => outcome.sent += 1,
                Err(err) => {
                    error!(
                        tenant_id = %tenant.id,
                        contact_id = %contact.id,
                        error = ?err,
                        "reminders: gateway send failed"
                    );
                    outcome.send_failures += 1;
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crates::domain::{
        entities::plans::PlanEntity,
        repositories::{
            contacts::MockContactRepository, daily_quota::MockDailyQuotaRepository,
            messaging::MockMessagingGateway, plans::MockPlanRepository,
            tenants::MockTenantRepository,
        },
        value_objects::{
            enums::plan_statuses::PlanStatus,
            plans::PlanFeatures,
        },
    };
    use mockall::predicate::eq;

    use super::*;

    fn plan(id: Uuid, flags: &[FeatureFlag]) -> PlanEntity {
        PlanEntity {
            id,
            name: Some("Plan".to_string()),
            description: None,
            price_minor: 9990,
            duration_days: 30,
            features: PlanFeatures {
                flags: flags.iter().copied().collect(),
                daily_message_limit: Some(100),
            },
            is_featured: false,
            status: PlanStatus::Active,
        }
    }

    fn tenant(plan_id: Uuid, token: &str) -> TenantEntity {
        let now = Utc::now();
        TenantEntity {
            id: Uuid::new_v4(),
            business_name: "Studio Mia".to_string(),
            plan_id,
            access_expires_at: None,
            whatsapp_connected: true,
            instance_token: token.to_string(),
            webhook_configured: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn contact(tenant_id: Uuid, name: &str, phone: &str) -> ContactEntity {
        ContactEntity {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            phone: phone.to_string(),
            birth_month: Some(1),
            birth_day: Some(10),
            last_visit_at: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn plan_repo_with(plans: Vec<PlanEntity>) -> MockPlanRepository {
        let mut repo = MockPlanRepository::new();
        repo.expect_find_by_id().returning(move |id| {
            let found = plans.iter().find(|p| p.id == id).cloned();
            Box::pin(async move { Ok(found) })
        });
        repo
    }

    fn jobs(
        plan_repo: MockPlanRepository,
        tenant_repo: MockTenantRepository,
        quota_repo: MockDailyQuotaRepository,
        contact_repo: MockContactRepository,
        gateway: MockMessagingGateway,
    ) -> Arc<
        ReminderJobs<
            MockPlanRepository,
            MockTenantRepository,
            MockDailyQuotaRepository,
            MockContactRepository,
            MockMessagingGateway,
        >,
    > {
        Arc::new(ReminderJobs::new(
            Arc::new(FeatureAccessUseCase::new(Arc::new(plan_repo))),
            Arc::new(tenant_repo),
            Arc::new(QuotaUseCase::new(Arc::new(quota_repo))),
            Arc::new(contact_repo),
            Arc::new(gateway),
        ))
    }

    #[tokio::test]
    async fn unentitled_tenant_is_skipped_without_contact_lookup() {
        let starter = plan(Uuid::new_v4(), &[FeatureFlag::Reminder24h]);
        let free = plan(crates::domain::value_objects::plans::FREE_PLAN_ID, &[]);
        let tenant = tenant(starter.id, "tok-1");

        let mut tenant_repo = MockTenantRepository::new();
        let listed = vec![tenant];
        tenant_repo.expect_list_connected().returning(move || {
            let listed = listed.clone();
            Box::pin(async move { Ok(listed) })
        });

        // No expectations on contacts/quota/gateway: any call panics.
        let jobs = jobs(
            plan_repo_with(vec![starter, free]),
            tenant_repo,
            MockDailyQuotaRepository::new(),
            MockContactRepository::new(),
            MockMessagingGateway::new(),
        );

        let summary = jobs.run(ReminderKind::Birthday, day()).await.unwrap();
        assert_eq!(summary.tenants_skipped, 1);
        assert_eq!(summary.tenants_processed, 0);
        assert_eq!(summary.messages_sent, 0);
    }

    #[tokio::test]
    async fn entitled_tenant_sends_birthday_messages_under_quota() {
        let pro = plan(Uuid::new_v4(), &[FeatureFlag::BirthdayReminder]);
        let tenant = tenant(pro.id, "tok-1");
        let tenant_id = tenant.id;

        let mut tenant_repo = MockTenantRepository::new();
        let listed = vec![tenant];
        tenant_repo.expect_list_connected().returning(move || {
            let listed = listed.clone();
            Box::pin(async move { Ok(listed) })
        });

        let mut contact_repo = MockContactRepository::new();
        contact_repo
            .expect_list_birthday_contacts()
            .with(eq(tenant_id), eq(1), eq(10))
            .returning(move |tid, _, _| {
                let contacts = vec![
                    contact(tid, "Ana", "5511912345671"),
                    contact(tid, "Bruno", "5511912345672"),
                ];
                Box::pin(async move { Ok(contacts) })
            });

        let mut quota_repo = MockDailyQuotaRepository::new();
        let mut count = 0;
        quota_repo
            .expect_increment_if_below()
            .returning(move |_, _, _, _| {
                count += 1;
                let current = count;
                Box::pin(async move { Ok((true, current)) })
            });

        let mut gateway = MockMessagingGateway::new();
        gateway
            .expect_send_text()
            .times(2)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let jobs = jobs(
            plan_repo_with(vec![pro]),
            tenant_repo,
            quota_repo,
            contact_repo,
            gateway,
        );

        let summary = jobs.run(ReminderKind::Birthday, day()).await.unwrap();
        assert_eq!(summary.tenants_processed, 1);
        assert_eq!(summary.messages_sent, 2);
        assert_eq!(summary.send_failures, 0);
    }

    #[tokio::test]
    async fn one_failing_tenant_does_not_abort_the_batch() {
        let pro = plan(Uuid::new_v4(), &[FeatureFlag::BirthdayReminder]);
        let healthy = tenant(pro.id, "tok-ok");
        let healthy_id = healthy.id;
        let broken = tenant(pro.id, "tok-broken");
        let broken_id = broken.id;

        let mut tenant_repo = MockTenantRepository::new();
        let listed = vec![healthy, broken];
        tenant_repo.expect_list_connected().returning(move || {
            let listed = listed.clone();
            Box::pin(async move { Ok(listed) })
        });

        let mut contact_repo = MockContactRepository::new();
        contact_repo
            .expect_list_birthday_contacts()
            .with(eq(healthy_id), eq(1), eq(10))
            .returning(move |tid, _, _| {
                let contacts = vec![contact(tid, "Ana", "5511912345671")];
                Box::pin(async move { Ok(contacts) })
            });
        contact_repo
            .expect_list_birthday_contacts()
            .with(eq(broken_id), eq(1), eq(10))
            .returning(|_, _, _| Box::pin(async { Err(anyhow::anyhow!("query timed out")) }));

        let mut quota_repo = MockDailyQuotaRepository::new();
        quota_repo
            .expect_increment_if_below()
            .returning(|_, _, _, _| Box::pin(async { Ok((true, 1)) }));

        let mut gateway = MockMessagingGateway::new();
        gateway
            .expect_send_text()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let jobs = jobs(
            plan_repo_with(vec![pro]),
            tenant_repo,
            quota_repo,
            contact_repo,
            gateway,
        );

        let summary = jobs.run(ReminderKind::Birthday, day()).await.unwrap();
        assert_eq!(summary.tenants_processed, 1);
        assert_eq!(summary.messages_sent, 1);
        assert_eq!(summary.tenant_failures.len(), 1);
        assert_eq!(summary.tenant_failures[0].tenant_id, broken_id);
    }

    #[tokio::test]
    async fn quota_exhaustion_is_counted_not_fatal() {
        let pro = plan(Uuid::new_v4(), &[FeatureFlag::BirthdayReminder]);
        let tenant = tenant(pro.id, "tok-1");
        let tenant_id = tenant.id;

        let mut tenant_repo = MockTenantRepository::new();
        let listed = vec![tenant];
        tenant_repo.expect_list_connected().returning(move || {
            let listed = listed.clone();
            Box::pin(async move { Ok(listed) })
        });

        let mut contact_repo = MockContactRepository::new();
        contact_repo
            .expect_list_birthday_contacts()
            .with(eq(tenant_id), eq(1), eq(10))
            .returning(move |tid, _, _| {
                let contacts = vec![
                    contact(tid, "Ana", "5511912345671"),
                    contact(tid, "Bruno", "5511912345672"),
                ];
                Box::pin(async move { Ok(contacts) })
            });

        let mut quota_repo = MockDailyQuotaRepository::new();
        let mut calls = 0;
        quota_repo
            .expect_increment_if_below()
            .returning(move |_, _, _, _| {
                calls += 1;
                let allowed = calls == 1;
                Box::pin(async move { Ok((allowed, 1)) })
            });

        let mut gateway = MockMessagingGateway::new();
        gateway
            .expect_send_text()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let jobs = jobs(
            plan_repo_with(vec![pro]),
            tenant_repo,
            quota_repo,
            contact_repo,
            gateway,
        );

        let summary = jobs.run(ReminderKind::Birthday, day()).await.unwrap();
        assert_eq!(summary.messages_sent, 1);
        assert_eq!(summary.messages_denied_quota, 1);
    }
}
