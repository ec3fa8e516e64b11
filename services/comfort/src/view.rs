//! Selection state and the panels derived from it

use crate::cache::{EntityCache, EntityKind};
use crate::chart::{Axis, VoltageStatus};
use crate::error::ComfortError;
use crate::model::{Controller, ControllerKind};

/// Shown wherever a group has no usable controller
pub const NO_CONTROLLER_LABEL: &str = "no controller attached";

/// Label of the leading "detach" entry in the controller picker
pub const NONE_CHOICE_LABEL: &str = "none";

/// Range a controller tries to keep its group within
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceBand {
    pub lower: f64,
    pub upper: f64,
    pub axis: Axis,
}

/// `[setpoint - tolerance, setpoint + tolerance]`, when both are known.
pub fn acceptance_band(controller: &Controller) -> Option<AcceptanceBand> {
    let setpoint = controller.setpoint?;
    let tolerance = controller.tolerance?;
    let axis = match controller.kind {
        ControllerKind::Temperature => Axis::Temperature,
        ControllerKind::Other(_) => Axis::Humidity,
    };
    Some(AcceptanceBand {
        lower: setpoint - tolerance,
        upper: setpoint + tolerance,
        axis,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorPanel {
    pub sensor_id: String,
    pub label: String,
    pub voltage: Option<VoltageStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerChoice {
    /// `None` is the detach entry
    pub controller_id: Option<String>,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberChoice {
    pub sensor_id: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupPanel {
    pub group_id: String,
    pub name: String,
    pub controller_label: String,
    pub controller_choices: Vec<ControllerChoice>,
    pub members: Vec<MemberChoice>,
    pub band: Option<AcceptanceBand>,
}

/// Which sensor and which group the user is looking at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    active_sensor: Option<String>,
    active_group: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_sensor(&self) -> Option<&str> {
        self.active_sensor.as_deref()
    }

    pub fn active_group(&self) -> Option<&str> {
        self.active_group.as_deref()
    }

    pub fn select_sensor(&mut self, cache: &EntityCache, sensor_id: &str) -> crate::Result<()> {
        if !cache.sensors.contains(sensor_id) {
            return Err(ComfortError::NotFound {
                kind: EntityKind::Sensor,
                id: sensor_id.to_string(),
            });
        }
        self.active_sensor = Some(sensor_id.to_string());
        Ok(())
    }

    pub fn select_group(&mut self, cache: &EntityCache, group_id: &str) -> crate::Result<()> {
        if !cache.sensor_groups.contains(group_id) {
            return Err(ComfortError::NotFound {
                kind: EntityKind::SensorGroup,
                id: group_id.to_string(),
            });
        }
        self.active_group = Some(group_id.to_string());
        Ok(())
    }

    /// Clear the active group so the next group name save creates one
    pub fn begin_new_group(&mut self) {
        self.active_group = None;
    }

    /// Fill unset selections: the first sensor and the last group.
    pub fn select_defaults(&mut self, cache: &EntityCache) {
        if self.active_sensor.is_none() {
            self.active_sensor = cache.sensors.first().map(|s| s.id.clone());
        }
        if self.active_group.is_none() {
            self.active_group = cache.sensor_groups.last().map(|g| g.id.clone());
        }
    }

    /// Replace selections that no longer exist in `cache`.
    ///
    /// An unset selection stays unset.
    pub fn reconcile(&mut self, cache: &EntityCache) {
        if let Some(id) = &self.active_sensor {
            if !cache.sensors.contains(id) {
                tracing::debug!("Active sensor {} is gone", id);
                self.active_sensor = cache.sensors.first().map(|s| s.id.clone());
            }
        }
        if let Some(id) = &self.active_group {
            if !cache.sensor_groups.contains(id) {
                tracing::debug!("Active sensor group {} is gone", id);
                self.active_group = cache.sensor_groups.last().map(|g| g.id.clone());
            }
        }
    }

    /// Controller of the active group, if it has one that still exists
    pub fn active_controller<'a>(&self, cache: &'a EntityCache) -> Option<&'a Controller> {
        let group = cache.sensor_groups.get(self.active_group.as_deref()?)?;
        cache.controller_of(group)
    }

    pub fn active_band(&self, cache: &EntityCache) -> Option<AcceptanceBand> {
        self.active_controller(cache).and_then(acceptance_band)
    }

    pub fn sensor_panel(
        &self,
        cache: &EntityCache,
        voltage: Option<VoltageStatus>,
    ) -> Option<SensorPanel> {
        let sensor = cache.sensors.get(self.active_sensor.as_deref()?)?;
        Some(SensorPanel {
            sensor_id: sensor.id.clone(),
            label: sensor.label(),
            voltage,
        })
    }

    pub fn group_panel(&self, cache: &EntityCache) -> Option<GroupPanel> {
        let group = cache.sensor_groups.get(self.active_group.as_deref()?)?;
        let controller = cache.controller_of(group);

        let mut controller_choices = vec![ControllerChoice {
            controller_id: None,
            label: NONE_CHOICE_LABEL.to_string(),
            selected: controller.is_none(),
        }];
        controller_choices.extend(cache.controllers.list().map(|c| ControllerChoice {
            controller_id: Some(c.id.clone()),
            label: c.display_name.clone(),
            selected: controller.is_some_and(|attached| attached.id == c.id),
        }));

        let members = cache
            .sensors
            .list()
            .map(|s| MemberChoice {
                sensor_id: s.id.clone(),
                label: s.label(),
                checked: group.has_member(&s.id),
            })
            .collect();

        Some(GroupPanel {
            group_id: group.id.clone(),
            name: group.display_name.clone(),
            controller_label: controller
                .map(|c| c.display_name.clone())
                .unwrap_or_else(|| NO_CONTROLLER_LABEL.to_string()),
            controller_choices,
            members,
            band: controller.and_then(acceptance_band),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Sensor, SensorGroup};

    fn cache() -> EntityCache {
        let mut cache = EntityCache::new();
        cache.sensors.replace(Sensor::new("1", Some("Attic")));
        cache.sensors.replace(Sensor::new("2", None));
        cache.controllers.replace(
            Controller::new("10", "Furnace", ControllerKind::Temperature).with_setpoint(20.0, 2.0),
        );
        cache.controllers.replace(Controller::new(
            "11",
            "Dehumidifier",
            ControllerKind::Other("humidity".to_string()),
        ));
        cache
            .sensor_groups
            .replace(SensorGroup::new("5", "Upstairs").with_members(["1"]));
        cache
            .sensor_groups
            .replace(SensorGroup::new("6", "Basement").with_controller("10"));
        cache
    }

    #[test]
    fn band_from_setpoint_and_tolerance() {
        let controller =
            Controller::new("1", "Furnace", ControllerKind::Temperature).with_setpoint(20.0, 2.0);
        let band = acceptance_band(&controller).unwrap();
        assert_eq!((band.lower, band.upper), (18.0, 22.0));
        assert_eq!(band.axis, Axis::Temperature);
    }

    #[test]
    fn no_band_without_setpoint() {
        let controller = Controller::new("1", "Furnace", ControllerKind::Temperature);
        assert!(acceptance_band(&controller).is_none());
    }

    #[test]
    fn non_temperature_band_goes_on_humidity_axis() {
        let controller = Controller::new("1", "Dryer", ControllerKind::Other("humidity".into()))
            .with_setpoint(50.0, 5.0);
        assert_eq!(acceptance_band(&controller).unwrap().axis, Axis::Humidity);
    }

    #[test]
    fn defaults_pick_first_sensor_and_last_group() {
        let mut view = ViewState::new();
        view.select_defaults(&cache());
        assert_eq!(view.active_sensor(), Some("1"));
        assert_eq!(view.active_group(), Some("6"));
    }

    #[test]
    fn selecting_unknown_group_is_not_found() {
        let mut view = ViewState::new();
        let err = view.select_group(&cache(), "99").unwrap_err();
        assert!(matches!(err, ComfortError::NotFound { kind: EntityKind::SensorGroup, .. }));
        assert_eq!(view.active_group(), None);
    }

    #[test]
    fn reselecting_is_a_no_op() {
        let cache = cache();
        let mut view = ViewState::new();
        view.select_group(&cache, "5").unwrap();
        let before = view.clone();
        view.select_group(&cache, "5").unwrap();
        assert_eq!(view, before);
    }

    #[test]
    fn group_panel_with_controller_has_band() {
        let mut view = ViewState::new();
        let cache = cache();
        view.select_group(&cache, "6").unwrap();

        let panel = view.group_panel(&cache).unwrap();
        assert_eq!(panel.controller_label, "Furnace");
        let band = panel.band.unwrap();
        assert_eq!((band.lower, band.upper), (18.0, 22.0));
        let selected: Vec<_> = panel.controller_choices.iter().filter(|c| c.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].controller_id.as_deref(), Some("10"));
    }

    #[test]
    fn dangling_controller_shows_default_label() {
        let mut cache = cache();
        cache
            .sensor_groups
            .replace(SensorGroup::new("7", "Garage").with_controller("42"));
        let mut view = ViewState::new();
        view.select_group(&cache, "7").unwrap();

        let panel = view.group_panel(&cache).unwrap();
        assert_eq!(panel.controller_label, NO_CONTROLLER_LABEL);
        assert!(panel.band.is_none());
        assert!(panel.controller_choices[0].selected);
        assert!(view.active_controller(&cache).is_none());
    }

    #[test]
    fn controller_choices_start_with_none() {
        let mut view = ViewState::new();
        let cache = cache();
        view.select_group(&cache, "5").unwrap();

        let panel = view.group_panel(&cache).unwrap();
        let labels: Vec<&str> = panel
            .controller_choices
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["none", "Furnace", "Dehumidifier"]);
        assert_eq!(panel.controller_choices[0].controller_id, None);
    }

    #[test]
    fn member_checklist_covers_all_sensors() {
        let mut view = ViewState::new();
        let cache = cache();
        view.select_group(&cache, "5").unwrap();

        let panel = view.group_panel(&cache).unwrap();
        assert_eq!(
            panel.members,
            vec![
                MemberChoice {
                    sensor_id: "1".to_string(),
                    label: "Attic".to_string(),
                    checked: true,
                },
                MemberChoice {
                    sensor_id: "2".to_string(),
                    label: "sensor 2".to_string(),
                    checked: false,
                },
            ]
        );
    }

    #[test]
    fn reconcile_falls_back_to_remaining_group() {
        let mut cache = cache();
        let mut view = ViewState::new();
        view.select_group(&cache, "6").unwrap();

        cache.sensor_groups.delete("6");
        view.reconcile(&cache);
        assert_eq!(view.active_group(), Some("5"));

        cache.sensor_groups.delete("5");
        view.reconcile(&cache);
        assert_eq!(view.active_group(), None);
    }

    #[test]
    fn reconcile_leaves_unset_group_alone() {
        let mut view = ViewState::new();
        view.begin_new_group();
        view.reconcile(&cache());
        assert_eq!(view.active_group(), None);
    }

    #[test]
    fn sensor_panel_labels_unnamed_sensor() {
        let mut view = ViewState::new();
        let cache = cache();
        view.select_sensor(&cache, "2").unwrap();
        let panel = view.sensor_panel(&cache, None).unwrap();
        assert_eq!(panel.label, "sensor 2");
    }
}
