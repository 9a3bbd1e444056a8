use duckdb::vtab::Value;
use libduckdb_sys::duckdb_free;
use libduckdb_sys::duckdb_get_double;
use libduckdb_sys::duckdb_get_varchar;
use libduckdb_sys::duckdb_value;
use std::ffi::CStr;
use std::os::raw::c_void;

/// Typed access to parameter values through the DuckDB C API
pub(crate) trait ValueBridge {
    /// Gets the raw pointer to the underlying DuckDB value
    fn get_value_ptr(&self) -> duckdb_value;

    /// Converts the value to a 64-bit floating point number
    fn to_double(&self) -> f64 {
        unsafe { duckdb_get_double(self.get_value_ptr()) }
    }

    /// Converts the value to an owned UTF-8 string
    fn to_varchar(&self) -> String {
        unsafe {
            let varchar = duckdb_get_varchar(self.get_value_ptr());
            let c_str = CStr::from_ptr(varchar);
            let string = c_str.to_string_lossy().into_owned();
            duckdb_free(varchar as *mut c_void);
            string
        }
    }
}

impl ValueBridge for Value {
    /// Relies on `Value` being a plain wrapper around a single `duckdb_value`;
    /// revisit whenever the duckdb crate is upgraded.
    fn get_value_ptr(&self) -> duckdb_value {
        unsafe { *(self as *const Value as *const duckdb_value) }
    }
}
