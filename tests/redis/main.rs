mod rdb;
