use super::Val;
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Error>;

/// ## Variable memory
///
/// Scalars, arrays, and the DEFINT letter table. Keys are canonical
/// uppercase names; the suffix (or DEFINT for plain names) fixes the
/// type, and every store coerces to it.

#[derive(Debug, Default)]
pub struct Var {
    vars: HashMap<String, Val>,
    arrays: HashMap<String, Array>,
    defint: [bool; 26],
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VarType {
    String,
    Integer,
    Double,
}

#[derive(Debug)]
struct Array {
    elem: VarType,
    elems: Vec<Val>,
}

const IMPLICIT_BOUND: usize = 10;

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    /// Drop values and arrays. DEFINT ranges survive; only a full
    /// reset forgets them.
    pub fn clear(&mut self) {
        self.vars.clear();
        self.arrays.clear();
    }

    pub fn reset(&mut self) {
        self.clear();
        self.defint = [false; 26];
    }

    pub fn set_defint_range(&mut self, from: char, to: char) {
        let from = (from.to_ascii_uppercase() as usize).saturating_sub('A' as usize);
        let to = (to.to_ascii_uppercase() as usize).saturating_sub('A' as usize);
        for index in from..=to.min(25) {
            self.defint[index] = true;
        }
    }

    fn type_of(&self, name: &str) -> VarType {
        if name.ends_with('$') {
            return VarType::String;
        }
        if name.ends_with('%') {
            return VarType::Integer;
        }
        let first = name.bytes().next().unwrap_or(b'A');
        if first.is_ascii_uppercase() && self.defint[(first - b'A') as usize] {
            VarType::Integer
        } else {
            VarType::Double
        }
    }

    fn default_for(t: VarType) -> Val {
        match t {
            VarType::String => Val::String(String::new()),
            VarType::Integer => Val::Integer(0),
            VarType::Double => Val::Double(0.0),
        }
    }

    fn coerce(value: Val, t: VarType) -> Result<Val> {
        match t {
            VarType::String => Ok(Val::String(value.to_string())),
            VarType::Integer => Ok(Val::Integer(value.as_integer()?)),
            VarType::Double => Ok(Val::Double(value.as_number())),
        }
    }

    pub fn fetch(&self, name: &str) -> Val {
        match self.vars.get(name) {
            Some(val) => val.clone(),
            None => Self::default_for(self.type_of(name)),
        }
    }

    pub fn store(&mut self, name: &str, value: Val) -> Result<()> {
        let value = Self::coerce(value, self.type_of(name))?;
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    /// DIM sizes an array exactly once; the bound is inclusive.
    pub fn dimension(&mut self, name: &str, bound: i64) -> Result<()> {
        if self.arrays.contains_key(name) {
            return Err(error!(Runtime; "Duplicate definition"));
        }
        if bound < 0 {
            return Err(error!(Runtime; "Bad subscript"));
        }
        let elem = self.type_of(name);
        self.arrays.insert(
            name.to_string(),
            Array {
                elem,
                elems: vec![Self::default_for(elem); bound as usize + 1],
            },
        );
        Ok(())
    }

    pub fn fetch_element(&mut self, name: &str, index: i64) -> Result<Val> {
        let array = self.implicit(name);
        let index = Self::check_index(array, index)?;
        Ok(array.elems[index].clone())
    }

    pub fn store_element(&mut self, name: &str, index: i64, value: Val) -> Result<()> {
        let elem = self.implicit(name).elem;
        let value = Self::coerce(value, elem)?;
        let array = self.implicit(name);
        let index = Self::check_index(array, index)?;
        array.elems[index] = value;
        Ok(())
    }

    /// First reference to an undimensioned array creates it with the
    /// implicit 0..=10 bound.
    fn implicit(&mut self, name: &str) -> &mut Array {
        if !self.arrays.contains_key(name) {
            let elem = self.type_of(name);
            self.arrays.insert(
                name.to_string(),
                Array {
                    elem,
                    elems: vec![Self::default_for(elem); IMPLICIT_BOUND + 1],
                },
            );
        }
        self.arrays.get_mut(name).unwrap()
    }

    fn check_index(array: &Array, index: i64) -> Result<usize> {
        if index < 0 {
            return Err(error!(Runtime; "Bad subscript"));
        }
        if index as usize >= array.elems.len() {
            return Err(error!(Runtime; "Subscript out of range"));
        }
        Ok(index as usize)
    }
}
