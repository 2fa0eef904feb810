use crate::domain::task::TaskSet;
use crate::error::Result;

pub fn to_yaml(set: &TaskSet) -> Result<String> {
    Ok(serde_yaml::to_string(set)?)
}
