//! Management use cases for setting up a hunt.
//!
//! Organisers create instances and their locations here; block editing lives
//! in [`crate::use_cases::blocks`] and team codes in [`crate::use_cases::teams`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scanquest_domain::{
    DomainError, GameStatus, Instance, InstanceId, InstanceName, InstanceSettings, Location,
    LocationId, LocationName, MarkerCode,
};

use crate::infrastructure::ports::{ClockPort, InstanceRepo, LocationRepo, RepoError};

/// Shared error type for management use cases.
#[derive(Debug, thiserror::Error)]
pub enum ManagementError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: String },
    #[error("Marker code {0} is already used in this instance")]
    DuplicateMarker(String),
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl ManagementError {
    fn from_save(e: RepoError) -> Self {
        match e.conflict_key("Location") {
            Some(marker) => Self::DuplicateMarker(marker.to_string()),
            None => Self::Repo(e),
        }
    }
}

/// Container for management use cases.
pub struct ManagementUseCases {
    pub instance: InstanceManagement,
    pub location: LocationManagement,
}

impl ManagementUseCases {
    pub fn new(instance: InstanceManagement, location: LocationManagement) -> Self {
        Self { instance, location }
    }
}

// =============================================================================
// Instances
// =============================================================================

pub struct InstanceManagement {
    instance: Arc<dyn InstanceRepo>,
    clock: Arc<dyn ClockPort>,
}

impl InstanceManagement {
    pub fn new(instance: Arc<dyn InstanceRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { instance, clock }
    }

    pub async fn get(&self, id: InstanceId) -> Result<Instance, ManagementError> {
        self.instance
            .get(id)
            .await?
            .ok_or_else(|| ManagementError::NotFound {
                entity_type: "Instance",
                id: id.to_string(),
            })
    }

    /// Status as of now
    pub fn status(&self, instance: &Instance) -> GameStatus {
        instance.status(self.clock.now())
    }

    pub async fn create(
        &self,
        name: &str,
        settings: InstanceSettings,
    ) -> Result<Instance, ManagementError> {
        let instance = Instance::new(InstanceName::new(name)?).with_settings(settings);
        self.instance.save(&instance).await?;
        tracing::info!(instance_id = %instance.id, name = %instance.name, "Created instance");
        Ok(instance)
    }

    pub async fn update_settings(
        &self,
        id: InstanceId,
        settings: InstanceSettings,
    ) -> Result<Instance, ManagementError> {
        let instance = self.get(id).await?.with_settings(settings);
        self.instance.save(&instance).await?;
        Ok(instance)
    }

    /// Set the play window. `None` for the start closes the game.
    pub async fn schedule(
        &self,
        id: InstanceId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Instance, ManagementError> {
        let instance = self.get(id).await?.with_schedule(start, end)?;
        self.instance.save(&instance).await?;
        tracing::info!(instance_id = %id, status = %instance.status(self.clock.now()), "Rescheduled instance");
        Ok(instance)
    }

    /// Open the game immediately.
    pub async fn start_now(&self, id: InstanceId) -> Result<Instance, ManagementError> {
        let mut instance = self.get(id).await?;
        instance.start_now(self.clock.now());
        self.instance.save(&instance).await?;
        tracing::info!(instance_id = %id, "Started instance");
        Ok(instance)
    }

    /// Remove the instance and everything played in it.
    pub async fn delete(&self, id: InstanceId) -> Result<(), ManagementError> {
        self.instance.delete(id).await.map_err(|e| {
            if e.is_not_found() {
                ManagementError::NotFound {
                    entity_type: "Instance",
                    id: id.to_string(),
                }
            } else {
                ManagementError::Repo(e)
            }
        })?;
        tracing::info!(instance_id = %id, "Deleted instance");
        Ok(())
    }
}

// =============================================================================
// Locations
// =============================================================================

/// Fields an organiser fills in for a location
#[derive(Debug, Clone, Default)]
pub struct LocationInput {
    pub name: String,
    pub marker_code: String,
    pub order: i32,
    pub points: i32,
    pub clue: Option<String>,
}

pub struct LocationManagement {
    instance: Arc<dyn InstanceRepo>,
    location: Arc<dyn LocationRepo>,
}

impl LocationManagement {
    pub fn new(instance: Arc<dyn InstanceRepo>, location: Arc<dyn LocationRepo>) -> Self {
        Self { instance, location }
    }

    pub async fn list(&self, instance_id: InstanceId) -> Result<Vec<Location>, ManagementError> {
        Ok(self.location.list_in_instance(instance_id).await?)
    }

    pub async fn create(
        &self,
        instance_id: InstanceId,
        input: LocationInput,
    ) -> Result<Location, ManagementError> {
        if self.instance.get(instance_id).await?.is_none() {
            return Err(ManagementError::NotFound {
                entity_type: "Instance",
                id: instance_id.to_string(),
            });
        }

        let location = apply(
            Location::new(
                instance_id,
                LocationName::new(input.name.clone())?,
                MarkerCode::new(&input.marker_code)?,
            ),
            input,
        );
        self.location
            .save(&location)
            .await
            .map_err(ManagementError::from_save)?;
        tracing::info!(
            instance_id = %instance_id,
            location_id = %location.id,
            marker = %location.marker_code,
            "Created location"
        );
        Ok(location)
    }

    /// Replace the editable fields; statistics are kept.
    pub async fn update(
        &self,
        id: LocationId,
        input: LocationInput,
    ) -> Result<Location, ManagementError> {
        let existing = self
            .location
            .get(id)
            .await?
            .ok_or_else(|| ManagementError::NotFound {
                entity_type: "Location",
                id: id.to_string(),
            })?;

        let location = apply(
            Location::new(
                existing.instance_id,
                LocationName::new(input.name.clone())?,
                MarkerCode::new(&input.marker_code)?,
            )
            .with_id(id)
            .with_stats(existing.stats),
            input,
        );
        self.location
            .save(&location)
            .await
            .map_err(ManagementError::from_save)?;
        Ok(location)
    }

    /// Remove the location with its blocks and visits. A team still
    /// occupying it is released.
    pub async fn delete(&self, id: LocationId) -> Result<(), ManagementError> {
        self.location.delete(id).await.map_err(|e| {
            if e.is_not_found() {
                ManagementError::NotFound {
                    entity_type: "Location",
                    id: id.to_string(),
                }
            } else {
                ManagementError::Repo(e)
            }
        })?;
        tracing::info!(location_id = %id, "Deleted location");
        Ok(())
    }

    pub async fn recompute_statistics(&self, instance_id: InstanceId) -> Result<(), ManagementError> {
        self.location.recompute_statistics(instance_id).await?;
        tracing::debug!(instance_id = %instance_id, "Recomputed location statistics");
        Ok(())
    }
}

fn apply(location: Location, input: LocationInput) -> Location {
    let location = location.with_order(input.order).with_points(input.points);
    match input.clue.filter(|c| !c.trim().is_empty()) {
        Some(clue) => location.with_clue(clue),
        None => location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{MockInstanceRepo, MockLocationRepo};
    use chrono::TimeZone;
    use mockall::predicate::*;
    use scanquest_domain::{GameStatus, LocationStats, NavigationMode};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn stored_instance(repo: &mut MockInstanceRepo) -> InstanceId {
        let id = InstanceId::new();
        repo.expect_get().with(eq(id)).returning(move |id| {
            Ok(Some(
                Instance::new(InstanceName::new("Harbour Hunt").unwrap()).with_id(id),
            ))
        });
        id
    }

    fn lighthouse() -> LocationInput {
        LocationInput {
            name: "Lighthouse".to_string(),
            marker_code: " aaa1 ".to_string(),
            order: 1,
            points: 10,
            clue: Some("Follow the beam".to_string()),
        }
    }

    #[tokio::test]
    async fn create_instance_saves_settings() {
        let mut repo = MockInstanceRepo::new();
        repo.expect_save()
            .withf(|i| i.settings.navigation_mode == NavigationMode::Random)
            .times(1)
            .returning(|_| Ok(()));

        let mgmt = InstanceManagement::new(Arc::new(repo), Arc::new(FixedClock(now())));
        let settings = InstanceSettings::default().with_navigation_mode(NavigationMode::Random);
        let instance = mgmt.create("  Harbour Hunt ", settings).await.unwrap();
        assert_eq!(instance.name.as_str(), "Harbour Hunt");
    }

    #[tokio::test]
    async fn blank_instance_name_is_rejected() {
        let mut repo = MockInstanceRepo::new();
        repo.expect_save().never();

        let mgmt = InstanceManagement::new(Arc::new(repo), Arc::new(FixedClock(now())));
        let result = mgmt.create("   ", InstanceSettings::default()).await;
        assert!(matches!(result, Err(ManagementError::Domain(_))));
    }

    #[tokio::test]
    async fn start_now_makes_the_game_active() {
        let mut repo = MockInstanceRepo::new();
        let id = stored_instance(&mut repo);
        repo.expect_save().times(1).returning(|_| Ok(()));

        let mgmt = InstanceManagement::new(Arc::new(repo), Arc::new(FixedClock(now())));
        let instance = mgmt.start_now(id).await.unwrap();
        assert_eq!(instance.status(now()), GameStatus::Active);
    }

    #[tokio::test]
    async fn deleting_missing_instance_is_not_found() {
        let mut repo = MockInstanceRepo::new();
        repo.expect_delete()
            .returning(|id| Err(RepoError::not_found("Instance", id)));

        let mgmt = InstanceManagement::new(Arc::new(repo), Arc::new(FixedClock(now())));
        let result = mgmt.delete(InstanceId::new()).await;
        assert!(matches!(
            result,
            Err(ManagementError::NotFound {
                entity_type: "Instance",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn create_location_normalises_marker() {
        let mut instances = MockInstanceRepo::new();
        let instance_id = stored_instance(&mut instances);
        let mut locations = MockLocationRepo::new();
        locations
            .expect_save()
            .withf(|l| l.marker_code.as_str() == "AAA1" && l.order == 1 && l.points == 10)
            .times(1)
            .returning(|_| Ok(()));

        let mgmt = LocationManagement::new(Arc::new(instances), Arc::new(locations));
        let location = mgmt.create(instance_id, lighthouse()).await.unwrap();
        assert_eq!(location.clue.as_deref(), Some("Follow the beam"));
    }

    #[tokio::test]
    async fn duplicate_marker_is_reported() {
        let mut instances = MockInstanceRepo::new();
        let instance_id = stored_instance(&mut instances);
        let mut locations = MockLocationRepo::new();
        locations
            .expect_save()
            .returning(|l| Err(RepoError::conflict("Location", &l.marker_code)));

        let mgmt = LocationManagement::new(Arc::new(instances), Arc::new(locations));
        let result = mgmt.create(instance_id, lighthouse()).await;
        assert!(matches!(result, Err(ManagementError::DuplicateMarker(m)) if m == "AAA1"));
    }

    #[tokio::test]
    async fn update_keeps_statistics_and_drops_blank_clue() {
        let instance_id = InstanceId::new();
        let stats = LocationStats {
            total_visits: 3,
            current_count: 1,
            avg_duration: 45.0,
        };
        let existing = Location::new(
            instance_id,
            LocationName::new("Lighthouse").unwrap(),
            MarkerCode::new("AAA1").unwrap(),
        )
        .with_stats(stats);
        let id = existing.id;

        let mut locations = MockLocationRepo::new();
        locations
            .expect_get()
            .with(eq(id))
            .returning(move |_| Ok(Some(existing.clone())));
        locations
            .expect_save()
            .withf(move |l| l.id == id && l.stats.total_visits == 3)
            .times(1)
            .returning(|_| Ok(()));

        let mgmt = LocationManagement::new(Arc::new(MockInstanceRepo::new()), Arc::new(locations));
        let input = LocationInput {
            name: "Old Lighthouse".to_string(),
            clue: Some("  ".to_string()),
            ..lighthouse()
        };
        let location = mgmt.update(id, input).await.unwrap();
        assert_eq!(location.name.as_str(), "Old Lighthouse");
        assert_eq!(location.clue, None);
        assert_eq!(location.stats, stats);
    }

    #[tokio::test]
    async fn location_in_unknown_instance_is_rejected() {
        let mut instances = MockInstanceRepo::new();
        instances.expect_get().returning(|_| Ok(None));
        let mut locations = MockLocationRepo::new();
        locations.expect_save().never();

        let mgmt = LocationManagement::new(Arc::new(instances), Arc::new(locations));
        let result = mgmt.create(InstanceId::new(), lighthouse()).await;
        assert!(matches!(result, Err(ManagementError::NotFound { .. })));
    }
}
